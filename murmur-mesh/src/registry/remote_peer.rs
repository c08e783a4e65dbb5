use crate::registry::{HandshakeState, PeerView};
use crate::transport::{ConnectionId, PeerTransport, RemoteAudio};
use murmur_core::utils::MAX_BUFFERED_CANDIDATES;
use murmur_core::{Participant, ParticipantState, PeerId, Position, SpatialAudioMixer};
use std::sync::Arc;
use tracing::{debug, warn};

/// A remote participant: the last snapshot it sent plus the connection
/// that carries its audio and state.
pub struct RemotePeer {
    id: PeerId,
    connection: ConnectionId,
    state: ParticipantState,
    handshake: HandshakeState,
    transport: Box<dyn PeerTransport>,
    audio: Arc<RemoteAudio>,
    mixer: SpatialAudioMixer,
    gain: f64,
    remote_description_applied: bool,
    pending_candidates: Vec<String>,
    deleted: bool,
}

impl RemotePeer {
    pub fn new(
        id: PeerId,
        connection: ConnectionId,
        transport: Box<dyn PeerTransport>,
        max_sound_distance: f64,
    ) -> Self {
        let audio = transport.audio();

        Self {
            id,
            connection,
            state: ParticipantState::default(),
            handshake: HandshakeState::Initiating,
            transport,
            audio,
            mixer: SpatialAudioMixer::new(max_sound_distance),
            gain: 0.0,
            remote_description_applied: false,
            pending_candidates: Vec::new(),
            deleted: false,
        }
    }

    pub fn id(&self) -> &PeerId {
        &self.id
    }

    pub fn connection(&self) -> ConnectionId {
        self.connection
    }

    pub fn handshake(&self) -> HandshakeState {
        self.handshake
    }

    pub fn transport(&self) -> &dyn PeerTransport {
        self.transport.as_ref()
    }

    pub fn audio(&self) -> &Arc<RemoteAudio> {
        &self.audio
    }

    pub fn gain(&self) -> f64 {
        self.gain
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    /// Moves the handshake forward. Illegal moves are logged and ignored.
    pub fn advance(&mut self, next: HandshakeState) -> bool {
        if !self.handshake.can_advance_to(next) {
            debug!(
                "Peer {} ignores handshake move {} -> {}",
                self.id, self.handshake, next
            );
            return false;
        }
        self.handshake = next;
        true
    }

    pub fn remote_description_applied(&self) -> bool {
        self.remote_description_applied
    }

    pub(crate) fn mark_remote_description_applied(&mut self) {
        self.remote_description_applied = true;
    }

    /// Keeps the newest `MAX_BUFFERED_CANDIDATES`.
    pub(crate) fn queue_candidate(&mut self, candidate: String) {
        if self.pending_candidates.len() == MAX_BUFFERED_CANDIDATES {
            self.pending_candidates.remove(0);
        }
        self.pending_candidates.push(candidate);
    }

    pub(crate) fn take_pending_candidates(&mut self) -> Vec<String> {
        std::mem::take(&mut self.pending_candidates)
    }

    /// Last write wins; snapshots carry no sequence number.
    pub fn apply_snapshot(&mut self, state: ParticipantState) {
        self.state = state;
    }

    /// Recomputes the output gain for a listener at `listener` and pushes it
    /// to the audio handle.
    pub fn update_gain(&mut self, listener: Position) -> f64 {
        self.gain = self.mixer.gain_between(listener, self.state.position);
        self.audio.set_gain(self.gain);
        self.gain
    }

    pub fn view(&self) -> PeerView {
        PeerView {
            state: self.state.clone(),
            handshake: self.handshake,
            gain: self.gain,
            audio: self.audio.clone(),
        }
    }

    /// Closes the connection and drops the audio. Only the first call does
    /// anything.
    pub async fn release(&mut self) {
        if self.deleted {
            return;
        }
        self.deleted = true;
        self.pending_candidates.clear();

        if let Err(e) = self.transport.close().await {
            warn!("Failed to close connection to {}: {:?}", self.id, e);
        }
        self.audio.release();
    }
}

impl Participant for RemotePeer {
    fn state(&self) -> &ParticipantState {
        &self.state
    }
}
