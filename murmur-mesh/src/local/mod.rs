mod local_participant;
mod microphone;

pub use local_participant::*;
pub use microphone::*;
