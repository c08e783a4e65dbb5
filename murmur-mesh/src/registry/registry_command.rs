use murmur_core::{Position, RoomId, SignalMessage};

/// Inputs to the registry loop from outside the transport layer: relay
/// traffic, pointer input, and the frame driver.
#[derive(Debug)]
pub enum RegistryCommand {
    /// Announce presence in a room to the relay.
    Join { room: RoomId },

    /// A message delivered by the relay.
    Signal(SignalMessage),

    /// One animation frame.
    Tick { elapsed_ms: f64 },

    PointerDown(Position),
    PointerMove(Position),
    PointerUp,

    SetProfile { avatar: u32, nickname: String },

    SetMicEnabled(bool),

    /// Close every connection and stop the loop.
    Shutdown,
}
