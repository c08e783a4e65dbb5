mod analyser;
mod spatial;

pub use analyser::{FrequencyAnalyser, mean_energy};
pub use spatial::{SpatialAudioMixer, gain};
