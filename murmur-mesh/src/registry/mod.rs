mod candidate_buffer;
mod context;
mod handshake;
mod mesh_observer;
mod peer_registry;
mod registry_command;
mod remote_peer;

pub(crate) use candidate_buffer::CandidateBuffer;
pub use context::*;
pub use handshake::*;
pub use mesh_observer::*;
pub use peer_registry::*;
pub use registry_command::*;
pub use remote_peer::*;
