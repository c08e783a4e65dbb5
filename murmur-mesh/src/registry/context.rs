use crate::registry::HandshakeState;
use crate::transport::RemoteAudio;
use dashmap::DashMap;
use murmur_core::{ParticipantState, PeerId, Position};
use std::sync::Arc;
use tokio::sync::watch;

/// What the read view knows about one remote peer.
#[derive(Debug, Clone)]
pub struct PeerView {
    pub state: ParticipantState,
    pub handshake: HandshakeState,
    pub gain: f64,
    pub audio: Arc<RemoteAudio>,
}

#[derive(Debug, Clone, Default)]
pub struct LocalView {
    pub id: Option<PeerId>,
    pub state: ParticipantState,
}

/// Read view of the mesh. Cheap to clone and safe to hold across threads;
/// only the registry loop writes to it.
#[derive(Clone)]
pub struct MeshContext {
    peers: Arc<DashMap<PeerId, PeerView>>,
    local: watch::Receiver<LocalView>,
}

impl MeshContext {
    pub(crate) fn new(
        peers: Arc<DashMap<PeerId, PeerView>>,
        local: watch::Receiver<LocalView>,
    ) -> Self {
        Self { peers, local }
    }

    pub fn nickname(&self, peer_id: &PeerId) -> Option<String> {
        self.peers.get(peer_id).map(|p| p.state.nickname.clone())
    }

    pub fn position(&self, peer_id: &PeerId) -> Option<Position> {
        self.peers.get(peer_id).map(|p| p.state.position)
    }

    pub fn rotation(&self, peer_id: &PeerId) -> Option<f64> {
        self.peers.get(peer_id).map(|p| p.state.rotation)
    }

    pub fn avatar(&self, peer_id: &PeerId) -> Option<u32> {
        self.peers.get(peer_id).map(|p| p.state.avatar)
    }

    pub fn volume(&self, peer_id: &PeerId) -> Option<f64> {
        self.peers.get(peer_id).map(|p| p.state.volume)
    }

    pub fn gain(&self, peer_id: &PeerId) -> Option<f64> {
        self.peers.get(peer_id).map(|p| p.gain)
    }

    pub fn handshake(&self, peer_id: &PeerId) -> Option<HandshakeState> {
        self.peers.get(peer_id).map(|p| p.handshake)
    }

    /// Inbound audio handle for a playback layer.
    pub fn audio(&self, peer_id: &PeerId) -> Option<Arc<RemoteAudio>> {
        self.peers.get(peer_id).map(|p| p.audio.clone())
    }

    pub fn peer(&self, peer_id: &PeerId) -> Option<PeerView> {
        self.peers.get(peer_id).map(|p| p.value().clone())
    }

    /// True while the identity has a registry entry, at any handshake stage.
    pub fn is_connection_alive(&self, peer_id: &PeerId) -> bool {
        self.peers.contains_key(peer_id)
    }

    pub fn list_peers(&self) -> Vec<PeerId> {
        let mut ids: Vec<PeerId> = self.peers.iter().map(|e| e.key().clone()).collect();
        ids.sort();
        ids
    }

    pub fn peer_count(&self) -> usize {
        self.peers.len()
    }

    /// Our relay session id, once the relay has sent it.
    pub fn local_id(&self) -> Option<PeerId> {
        self.local.borrow().id.clone()
    }

    pub fn local_state(&self) -> ParticipantState {
        self.local.borrow().state.clone()
    }

    pub(crate) fn upsert(&self, peer_id: PeerId, view: PeerView) {
        self.peers.insert(peer_id, view);
    }

    pub(crate) fn update<F>(&self, peer_id: &PeerId, f: F)
    where
        F: FnOnce(&mut PeerView),
    {
        if let Some(mut entry) = self.peers.get_mut(peer_id) {
            f(entry.value_mut());
        }
    }

    pub(crate) fn remove(&self, peer_id: &PeerId) {
        self.peers.remove(peer_id);
    }
}
