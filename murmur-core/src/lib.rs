pub mod audio;
pub mod model;
pub mod utils;

pub use audio::*;
pub use model::*;
