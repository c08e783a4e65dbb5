use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use dashmap::DashMap;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

use crate::config::{IceCandidatePolicy, SessionConfig};
use crate::local::{LocalParticipant, Microphone};
use crate::registry::{
    CandidateBuffer, HandshakeState, LocalView, MeshContext, MeshObserver, RegistryCommand,
    RemotePeer,
};
use crate::signaling::SignalingOutput;
use crate::transport::{
    ConnectionId, ConnectionState, SessionDescription, TransportConfig, TransportEvent,
    TransportFactory,
};
use murmur_core::{
    IceDto, IceServerConfig, Participant, ParticipantState, PeerId, RoomId,
    SessionDescriptionDto, SignalMessage,
};

/// Owns every connection of this client and drives the handshake with the
/// relay. Runs as a single task; relay messages, input and frames arrive as
/// commands, transports report back through their own queue.
pub struct PeerRegistry {
    local: LocalParticipant,

    /// Our relay session id. Unknown until the relay welcomes us.
    local_id: Option<PeerId>,

    peers: HashMap<PeerId, RemotePeer>,

    /// Candidates for identities without an entry yet (buffer policy only).
    orphan_candidates: CandidateBuffer,

    next_connection: u64,

    factory: Arc<dyn TransportFactory>,
    signaling: Arc<dyn SignalingOutput>,
    observer: Box<dyn MeshObserver>,

    context: MeshContext,
    local_tx: watch::Sender<LocalView>,

    transport_config: TransportConfig,
    candidate_policy: IceCandidatePolicy,
    max_sound_distance: f64,

    command_rx: mpsc::Receiver<RegistryCommand>,

    /// Cloned into every transport. Unbounded: transports post from inside
    /// `close()`, which the registry awaits.
    transport_tx: mpsc::UnboundedSender<TransportEvent>,
    transport_rx: mpsc::UnboundedReceiver<TransportEvent>,
}

impl PeerRegistry {
    pub fn new(
        config: &SessionConfig,
        microphone: Microphone,
        factory: Arc<dyn TransportFactory>,
        signaling: Arc<dyn SignalingOutput>,
        observer: Box<dyn MeshObserver>,
        command_rx: mpsc::Receiver<RegistryCommand>,
    ) -> Self {
        let (transport_tx, transport_rx) = mpsc::unbounded_channel();

        let local = LocalParticipant::new(
            &config.nickname,
            config.avatar,
            config.spawn,
            config.velocity,
            microphone,
        );
        let (local_tx, local_rx) = watch::channel(LocalView {
            id: None,
            state: local.snapshot(),
        });

        Self {
            local,
            local_id: None,
            peers: HashMap::new(),
            orphan_candidates: CandidateBuffer::default(),
            next_connection: 0,
            factory,
            signaling,
            observer,
            context: MeshContext::new(Arc::new(DashMap::new()), local_rx),
            local_tx,
            transport_config: config.transport.clone(),
            candidate_policy: config.candidate_policy,
            max_sound_distance: config.max_sound_distance,
            command_rx,
            transport_tx,
            transport_rx,
        }
    }

    pub fn context(&self) -> MeshContext {
        self.context.clone()
    }

    pub fn local(&self) -> &LocalParticipant {
        &self.local
    }

    pub fn local_id(&self) -> Option<&PeerId> {
        self.local_id.as_ref()
    }

    pub fn peer(&self, peer_id: &PeerId) -> Option<&RemotePeer> {
        self.peers.get(peer_id)
    }

    pub fn peer_ids(&self) -> Vec<PeerId> {
        let mut ids: Vec<PeerId> = self.peers.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn peer_count(&self) -> usize {
        self.peers.len()
    }

    pub fn transport_config(&self) -> &TransportConfig {
        &self.transport_config
    }

    /// Identities whose early candidates are held until they offer.
    pub fn orphan_candidate_peers(&self) -> usize {
        self.orphan_candidates.peer_count()
    }

    /// Main loop. Returns after `Shutdown` or when every command sender is
    /// gone, with all connections closed.
    pub async fn run(mut self) {
        info!("Mesh registry loop started");

        loop {
            tokio::select! {
                cmd = self.command_rx.recv() => {
                    match cmd {
                        Some(RegistryCommand::Shutdown) => {
                            info!("Shutdown requested");
                            break;
                        }
                        Some(c) => self.handle_command(c).await,
                        None => {
                            info!("Command channel closed. Shutting down mesh.");
                            break;
                        }
                    }
                }

                evt = self.transport_rx.recv() => {
                    match evt {
                        Some(e) => self.handle_transport_event(e).await,
                        None => {
                            // We hold a sender, so this should not happen.
                            warn!("Transport channel closed unexpectedly");
                            break;
                        }
                    }
                }
            }
        }

        self.shutdown().await;
        info!("Mesh registry loop finished");
    }

    /// Handles everything already queued, transport events first, without
    /// waiting. Returns how many messages were handled.
    pub async fn process_pending(&mut self) -> usize {
        let mut handled = 0;

        loop {
            if let Ok(evt) = self.transport_rx.try_recv() {
                self.handle_transport_event(evt).await;
                handled += 1;
                continue;
            }

            match self.command_rx.try_recv() {
                Ok(RegistryCommand::Shutdown) => self.shutdown().await,
                Ok(cmd) => self.handle_command(cmd).await,
                Err(_) => break,
            }
            handled += 1;
        }

        handled
    }

    pub async fn handle_command(&mut self, cmd: RegistryCommand) {
        match cmd {
            RegistryCommand::Join { room } => self.join(room).await,
            RegistryCommand::Signal(msg) => self.handle_signal(msg).await,
            RegistryCommand::Tick { elapsed_ms } => self.tick(elapsed_ms).await,
            RegistryCommand::PointerDown(at) => self.local.pointer_down(at),
            RegistryCommand::PointerMove(at) => self.local.pointer_move(at),
            RegistryCommand::PointerUp => self.local.pointer_up(),
            RegistryCommand::SetProfile { avatar, nickname } => {
                self.local.set_profile(avatar, &nickname);
                self.publish_local();
            }
            RegistryCommand::SetMicEnabled(enabled) => {
                info!("Microphone {}", if enabled { "enabled" } else { "muted" });
                self.local.set_mic_enabled(enabled);
            }
            RegistryCommand::Shutdown => self.shutdown().await,
        }
    }

    async fn handle_signal(&mut self, msg: SignalMessage) {
        match msg {
            SignalMessage::Welcome { peer_id } => self.on_welcome(peer_id).await,
            SignalMessage::IceConfig { ice_servers } => self.on_ice_config(ice_servers),
            SignalMessage::NeedToOffer(targets) => self.on_membership_announced(targets).await,
            SignalMessage::Offer(dto) => self.on_offer_received(dto).await,
            SignalMessage::Answer(dto) => self.on_answer_received(dto).await,
            SignalMessage::Ice(dto) => self.on_ice_candidate_received(dto).await,
            SignalMessage::JoinRoom(room) => {
                debug!("Ignoring relay-bound joinRoom for '{}'", room);
            }
        }
    }

    pub async fn handle_transport_event(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::StateChanged(peer_id, connection, state) => {
                self.on_connection_state_changed(peer_id, connection, state)
                    .await;
            }
            TransportEvent::CandidateGenerated(peer_id, connection, candidate) => {
                self.on_local_candidate(peer_id, connection, candidate)
                    .await;
            }
            TransportEvent::Message(peer_id, connection, data) => {
                self.on_state_message(peer_id, connection, data).await;
            }
            TransportEvent::TrackReceived(peer_id, connection) => {
                if self.is_current(&peer_id, connection) {
                    info!("Audio from {} is attached", peer_id);
                }
            }
        }
    }

    /// Announces presence to the relay. An unreachable relay is the
    /// signaling layer's to log; no peers will appear.
    pub async fn join(&mut self, room: RoomId) {
        info!("Joining room '{}'", room);
        self.orphan_candidates.clear();
        self.signaling.join(room).await;
    }

    pub async fn on_welcome(&mut self, peer_id: PeerId) {
        info!("Relay assigned session id {}", peer_id);

        if self.peers.contains_key(&peer_id) {
            warn!("Dropping entry that carries our own id {}", peer_id);
            self.remove_peer(&peer_id).await;
        }
        self.orphan_candidates.clear();
        self.local_id = Some(peer_id);
        self.publish_local();
    }

    /// Applies to connections created from now on.
    pub fn on_ice_config(&mut self, ice_servers: Vec<IceServerConfig>) {
        if ice_servers.is_empty() {
            debug!("Relay sent an empty ICE server list, keeping current one");
            return;
        }
        info!("Using {} ICE server(s) from the relay", ice_servers.len());
        self.transport_config.ice_servers = ice_servers;
    }

    /// We are the newcomer: offer to everyone already in the room.
    pub async fn on_membership_announced(&mut self, targets: Vec<PeerId>) {
        for target in targets {
            if self.is_self(&target) {
                debug!("Skipping self in membership list");
                continue;
            }
            if self.peers.contains_key(&target) {
                debug!("Already have an entry for {}, not offering again", target);
                continue;
            }
            if !self.create_peer(target.clone()).await {
                continue;
            }
            self.send_offer(&target).await;
        }
    }

    async fn send_offer(&mut self, peer_id: &PeerId) {
        let Some(peer) = self.peers.get_mut(peer_id) else {
            return;
        };

        match peer.transport().create_offer().await {
            Ok(sdp) => {
                peer.advance(HandshakeState::Offered);
                self.context.upsert(peer_id.clone(), peer.view());
                self.signaling.send_offer(peer_id.clone(), sdp).await;
            }
            Err(e) => error!("Failed to create offer for {}: {:?}", peer_id, e),
        }
    }

    pub async fn on_offer_received(&mut self, dto: SessionDescriptionDto) {
        let from = dto.from_client_id;
        if self.is_self(&from) || !self.is_addressed_to_us(&dto.to_client_id) {
            debug!("Ignoring offer from {} to {}", from, dto.to_client_id);
            return;
        }

        if !self.peers.contains_key(&from) && !self.create_peer(from.clone()).await {
            return;
        }
        let Some(peer) = self.peers.get_mut(&from) else {
            return;
        };

        if let Err(e) = peer
            .transport()
            .set_remote_description(SessionDescription::Offer(dto.sdp))
            .await
        {
            error!("SDP offer from {} rejected: {:?}", from, e);
            return;
        }
        peer.mark_remote_description_applied();
        self.flush_candidates(&from).await;

        let Some(peer) = self.peers.get_mut(&from) else {
            return;
        };
        match peer.transport().create_answer().await {
            Ok(sdp) => {
                if !peer.handshake().is_connected() {
                    peer.advance(HandshakeState::ConnectedPendingIce);
                }
                self.context.upsert(from.clone(), peer.view());
                self.signaling.send_answer(from, sdp).await;
            }
            Err(e) => error!("Failed to create answer for {}: {:?}", from, e),
        }
    }

    pub async fn on_answer_received(&mut self, dto: SessionDescriptionDto) {
        let from = dto.from_client_id;
        let Some(peer) = self.peers.get_mut(&from) else {
            debug!("Answer from unknown peer {}, ignoring", from);
            return;
        };

        if let Err(e) = peer
            .transport()
            .set_remote_description(SessionDescription::Answer(dto.sdp))
            .await
        {
            error!("SDP answer from {} rejected: {:?}", from, e);
            return;
        }
        peer.mark_remote_description_applied();
        if !peer.handshake().is_connected() {
            peer.advance(HandshakeState::ConnectedPendingIce);
        }
        self.context.upsert(from.clone(), peer.view());

        self.flush_candidates(&from).await;
    }

    pub async fn on_ice_candidate_received(&mut self, dto: IceDto) {
        let from = dto.from_client_id;
        if self.is_self(&from) {
            return;
        }

        let buffering = self.candidate_policy == IceCandidatePolicy::Buffer;

        let Some(peer) = self.peers.get_mut(&from) else {
            if buffering {
                debug!("Buffering candidate from unknown peer {}", from);
                self.orphan_candidates.push(from, dto.ice);
            } else {
                debug!("Candidate from unknown peer {}, dropping", from);
            }
            return;
        };

        if buffering && !peer.remote_description_applied() {
            debug!("Buffering candidate from {} until its description arrives", from);
            peer.queue_candidate(dto.ice);
            return;
        }

        if let Err(e) = peer.transport().add_ice_candidate(dto.ice).await {
            warn!("Failed to add ICE candidate from {}: {:?}", from, e);
        }
    }

    /// Applies candidates that were held back for `peer_id`.
    async fn flush_candidates(&mut self, peer_id: &PeerId) {
        let orphans = self.orphan_candidates.take(peer_id);
        let Some(peer) = self.peers.get_mut(peer_id) else {
            return;
        };

        let mut candidates = orphans;
        candidates.extend(peer.take_pending_candidates());
        if candidates.is_empty() {
            return;
        }

        debug!("Applying {} buffered candidate(s) from {}", candidates.len(), peer_id);
        for candidate in candidates {
            if let Err(e) = peer.transport().add_ice_candidate(candidate).await {
                warn!("Failed to add buffered ICE candidate from {}: {:?}", peer_id, e);
            }
        }
    }

    pub async fn on_connection_state_changed(
        &mut self,
        peer_id: PeerId,
        connection: ConnectionId,
        state: ConnectionState,
    ) {
        if !self.is_current(&peer_id, connection) {
            debug!(
                "State {:?} for {} {} is stale, ignoring",
                state, peer_id, connection
            );
            return;
        }

        match state {
            ConnectionState::Connected => {
                let Some(peer) = self.peers.get_mut(&peer_id) else {
                    return;
                };
                if peer.handshake().is_connected() {
                    return;
                }
                if peer.advance(HandshakeState::Connected) {
                    info!("Connected to {}", peer_id);
                    self.context.upsert(peer_id, peer.view());
                }
            }
            s if s.is_terminal() => {
                info!("Connection to {} is {:?}, removing", peer_id, s);
                self.remove_peer(&peer_id).await;
            }
            s => debug!("Connection to {} is {:?}", peer_id, s),
        }
    }

    /// Sends a candidate our transport discovered to the peer.
    pub async fn on_local_candidate(
        &mut self,
        peer_id: PeerId,
        connection: ConnectionId,
        candidate: String,
    ) {
        if !self.is_current(&peer_id, connection) {
            debug!("Local candidate for stale connection to {}", peer_id);
            return;
        }
        self.signaling.send_ice(peer_id, candidate).await;
    }

    pub async fn on_state_message(&mut self, peer_id: PeerId, connection: ConnectionId, data: Bytes) {
        if !self.is_current(&peer_id, connection) {
            debug!("State message from stale connection to {}", peer_id);
            return;
        }
        let Some(peer) = self.peers.get_mut(&peer_id) else {
            return;
        };

        match ParticipantState::from_slice(&data) {
            Ok(state) => {
                peer.apply_snapshot(state);
                self.context.upsert(peer_id.clone(), peer.view());
                self.observer.on_peer_updated(&self.context, peer_id).await;
            }
            Err(e) => warn!("Undecodable state from {}: {}", peer_id, e),
        }
    }

    /// One frame: move, measure, publish, attenuate.
    pub async fn tick(&mut self, elapsed_ms: f64) {
        self.local.update(elapsed_ms);
        self.publish_local();

        let snapshot = match self.local.snapshot().to_bytes() {
            Ok(bytes) => bytes,
            Err(e) => {
                error!("Failed to encode local state: {}", e);
                return;
            }
        };
        let listener = self.local.position();

        for (peer_id, peer) in self.peers.iter_mut() {
            if peer.transport().is_channel_open() {
                if let Err(e) = peer.transport().send(snapshot.clone()).await {
                    warn!("Failed to send state to {}: {:?}", peer_id, e);
                }
            }

            let gain = peer.update_gain(listener);
            self.context.update(peer_id, |view| view.gain = gain);
        }
    }

    /// Closes every connection. Observers hear about each removal.
    pub async fn shutdown(&mut self) {
        let ids = self.peer_ids();
        if !ids.is_empty() {
            info!("Closing {} connection(s)", ids.len());
        }
        for peer_id in ids {
            self.remove_peer(&peer_id).await;
        }
        self.orphan_candidates.clear();
    }

    async fn create_peer(&mut self, peer_id: PeerId) -> bool {
        self.next_connection += 1;
        let connection = ConnectionId(self.next_connection);

        let transport = match self
            .factory
            .create(
                peer_id.clone(),
                connection,
                &self.transport_config,
                self.transport_tx.clone(),
            )
            .await
        {
            Ok(t) => t,
            Err(e) => {
                error!("Failed to create connection to {}: {:?}", peer_id, e);
                return false;
            }
        };

        debug!("Created connection {} to {}", connection, peer_id);
        let peer = RemotePeer::new(
            peer_id.clone(),
            connection,
            transport,
            self.max_sound_distance,
        );
        self.context.upsert(peer_id.clone(), peer.view());
        self.peers.insert(peer_id.clone(), peer);

        self.observer.on_peer_created(&self.context, peer_id).await;
        true
    }

    /// Releases the entry once. Later calls for the same id find nothing.
    async fn remove_peer(&mut self, peer_id: &PeerId) {
        self.orphan_candidates.take(peer_id);

        let Some(mut peer) = self.peers.remove(peer_id) else {
            return;
        };
        peer.release().await;
        self.context.remove(peer_id);

        self.observer
            .on_peer_removed(&self.context, peer_id.clone())
            .await;
    }

    /// False for events from a connection that has since been replaced.
    fn is_current(&self, peer_id: &PeerId, connection: ConnectionId) -> bool {
        self.peers
            .get(peer_id)
            .is_some_and(|p| p.connection() == connection && !p.is_deleted())
    }

    fn is_self(&self, peer_id: &PeerId) -> bool {
        self.local_id.as_ref() == Some(peer_id)
    }

    /// Until the relay names us, every message counts as ours.
    fn is_addressed_to_us(&self, to: &PeerId) -> bool {
        self.local_id.as_ref().is_none_or(|id| id == to)
    }

    fn publish_local(&self) {
        self.local_tx.send_replace(LocalView {
            id: self.local_id.clone(),
            state: self.local.snapshot(),
        });
    }
}
