use async_trait::async_trait;
use murmur_core::{PeerId, RoomId};

/// The registry's outbound side of the relay. Delivery failures are the
/// implementation's to log; the registry never waits on the relay.
#[async_trait]
pub trait SignalingOutput: Send + Sync {
    /// Announce presence in `room`.
    async fn join(&self, room: RoomId);

    async fn send_offer(&self, peer_id: PeerId, sdp: String);

    async fn send_answer(&self, peer_id: PeerId, sdp: String);

    /// `candidate` is the JSON candidate init.
    async fn send_ice(&self, peer_id: PeerId, candidate: String);
}
