mod avatar;
mod participant;
mod peer;
mod position;
mod room;
mod signaling;

pub use avatar::Avatar;
pub use participant::{Participant, ParticipantState};
pub use peer::PeerId;
pub use position::Position;
pub use room::RoomId;
pub use signaling::{IceDto, IceServerConfig, SessionDescriptionDto, SignalMessage};
