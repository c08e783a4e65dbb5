use crate::registry::MeshContext;
use async_trait::async_trait;
use murmur_core::PeerId;

/// Change notifications for whatever presents the room. Called from the
/// registry loop, so implementations should return quickly.
#[async_trait]
pub trait MeshObserver: Send + Sync + 'static {
    async fn on_peer_created(&self, ctx: &MeshContext, peer_id: PeerId);

    /// A new state snapshot from the peer was applied.
    async fn on_peer_updated(&self, ctx: &MeshContext, peer_id: PeerId);

    async fn on_peer_removed(&self, ctx: &MeshContext, peer_id: PeerId);
}

pub struct NoopObserver;

#[async_trait]
impl MeshObserver for NoopObserver {
    async fn on_peer_created(&self, _ctx: &MeshContext, _peer_id: PeerId) {}

    async fn on_peer_updated(&self, _ctx: &MeshContext, _peer_id: PeerId) {}

    async fn on_peer_removed(&self, _ctx: &MeshContext, _peer_id: PeerId) {}
}
