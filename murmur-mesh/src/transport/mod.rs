mod connection_wrapper;
mod peer_transport;
mod remote_audio;
mod transport_config;
mod transport_event;

pub use connection_wrapper::*;
pub use peer_transport::*;
pub use remote_audio::*;
pub use transport_config::*;
pub use transport_event::*;
