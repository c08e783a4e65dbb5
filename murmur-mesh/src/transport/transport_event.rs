use bytes::Bytes;
use murmur_core::PeerId;
use std::fmt;

/// Distinguishes successive connections to the same identity, so events
/// from a torn-down connection cannot touch its replacement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(pub u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    New,
    Connecting,
    Connected,
    Disconnected,
    Failed,
    Closed,
}

impl ConnectionState {
    /// States after which the connection is torn down.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ConnectionState::Disconnected | ConnectionState::Failed | ConnectionState::Closed
        )
    }
}

/// Events a transport posts back to the registry loop.
#[derive(Debug)]
pub enum TransportEvent {
    /// The connection state machine moved.
    StateChanged(PeerId, ConnectionId, ConnectionState),

    /// A local ICE candidate was discovered; it must reach the peer via the relay.
    CandidateGenerated(PeerId, ConnectionId, String),

    /// A state snapshot arrived on the peer's data channel.
    Message(PeerId, ConnectionId, Bytes),

    /// The peer's audio track is attached to its `RemoteAudio`.
    TrackReceived(PeerId, ConnectionId),
}
