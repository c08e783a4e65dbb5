use std::fmt;

/// Where a stored peer is in connection establishment. Closed peers are
/// removed from the registry, so there is no closed variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandshakeState {
    /// Entry exists, no description has been exchanged yet.
    Initiating,
    /// We sent an offer and wait for the answer.
    Offered,
    /// Both descriptions are applied; ICE is still working.
    ConnectedPendingIce,
    Connected,
}

impl HandshakeState {
    /// Offerer: initiating, offered, pending ICE, connected.
    /// Responder: initiating, pending ICE, connected. Renegotiating an
    /// unfinished handshake stays in pending ICE.
    pub fn can_advance_to(self, next: HandshakeState) -> bool {
        use HandshakeState::*;

        matches!(
            (self, next),
            (Initiating, Offered)
                | (Initiating, ConnectedPendingIce)
                | (Offered, ConnectedPendingIce)
                | (ConnectedPendingIce, ConnectedPendingIce)
                | (ConnectedPendingIce, Connected)
        )
    }

    pub fn is_connected(self) -> bool {
        self == HandshakeState::Connected
    }
}

impl fmt::Display for HandshakeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HandshakeState::Initiating => "initiating",
            HandshakeState::Offered => "offered",
            HandshakeState::ConnectedPendingIce => "connected-pending-ice",
            HandshakeState::Connected => "connected",
        };
        f.write_str(name)
    }
}
