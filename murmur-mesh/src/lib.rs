mod config;
mod error;
mod local;
mod registry;
mod session;
mod signaling;
mod transport;

pub use config::*;
pub use error::*;
pub use local::*;
pub use registry::*;
pub use session::*;
pub use signaling::*;
pub use transport::*;
