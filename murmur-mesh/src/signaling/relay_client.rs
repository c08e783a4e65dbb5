use crate::registry::RegistryCommand;
use crate::signaling::SignalingOutput;
use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use murmur_core::{IceDto, PeerId, RoomId, SessionDescriptionDto, SignalMessage};
use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info, warn};

/// Websocket connection to the signaling relay.
///
/// Inbound messages become `RegistryCommand::Signal`. Outbound messages are
/// queued, so anything sent before the socket is up goes out once it is.
pub struct RelayClient {
    outbound: mpsc::UnboundedSender<SignalMessage>,
    local_id: Arc<RwLock<Option<PeerId>>>,
}

impl RelayClient {
    /// Starts connecting in the background and returns immediately. An
    /// unreachable relay is logged and the mesh simply stays empty.
    pub fn spawn(url: String, command_tx: mpsc::Sender<RegistryCommand>) -> Self {
        let (outbound, outbound_rx) = mpsc::unbounded_channel();
        let local_id = Arc::new(RwLock::new(None));

        tokio::spawn(run_connection(
            url,
            outbound_rx,
            command_tx,
            local_id.clone(),
        ));

        Self { outbound, local_id }
    }

    /// Our session id as announced by the relay.
    pub fn local_id(&self) -> Option<PeerId> {
        self.local_id.read().clone()
    }

    fn send_signal(&self, msg: SignalMessage) {
        if let Err(e) = self.outbound.send(msg) {
            error!("Relay connection is gone, dropping {:?}", e.0);
        }
    }

    /// Outbound peer messages carry our id; without one they cannot be routed.
    fn sender_id(&self, kind: &str, to: &PeerId) -> Option<PeerId> {
        let id = self.local_id();
        if id.is_none() {
            warn!("Dropping {} to {}: relay has not assigned our id yet", kind, to);
        }
        id
    }
}

#[async_trait]
impl SignalingOutput for RelayClient {
    async fn join(&self, room: RoomId) {
        self.send_signal(SignalMessage::JoinRoom(room));
    }

    async fn send_offer(&self, peer_id: PeerId, sdp: String) {
        let Some(from) = self.sender_id("offer", &peer_id) else {
            return;
        };
        self.send_signal(SignalMessage::Offer(SessionDescriptionDto {
            from_client_id: from,
            to_client_id: peer_id,
            sdp,
        }));
    }

    async fn send_answer(&self, peer_id: PeerId, sdp: String) {
        let Some(from) = self.sender_id("answer", &peer_id) else {
            return;
        };
        self.send_signal(SignalMessage::Answer(SessionDescriptionDto {
            from_client_id: from,
            to_client_id: peer_id,
            sdp,
        }));
    }

    async fn send_ice(&self, peer_id: PeerId, candidate: String) {
        let Some(from) = self.sender_id("candidate", &peer_id) else {
            return;
        };
        self.send_signal(SignalMessage::Ice(IceDto {
            from_client_id: from,
            to_client_id: peer_id,
            ice: candidate,
        }));
    }
}

async fn run_connection(
    url: String,
    mut outbound_rx: mpsc::UnboundedReceiver<SignalMessage>,
    command_tx: mpsc::Sender<RegistryCommand>,
    local_id: Arc<RwLock<Option<PeerId>>>,
) {
    let (ws_stream, _) = match connect_async(url.as_str()).await {
        Ok(s) => s,
        Err(e) => {
            error!("Relay {} unreachable: {}", url, e);
            return;
        }
    };
    info!("Connected to relay {}", url);

    let (mut sender, mut receiver) = ws_stream.split();

    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = outbound_rx.recv().await {
            match serde_json::to_string(&msg) {
                Ok(json) => {
                    if sender.send(Message::Text(json.into())).await.is_err() {
                        break;
                    }
                }
                Err(e) => error!("Failed to serialize signal message: {}", e),
            }
        }
        let _ = sender.close().await;
    });

    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            let parsed = match msg {
                Ok(Message::Text(text)) => serde_json::from_str::<SignalMessage>(text.as_str()),
                Ok(Message::Binary(data)) => serde_json::from_slice::<SignalMessage>(&data),
                Ok(Message::Close(_)) => break,
                Ok(_) => continue,
                Err(e) => {
                    warn!("Relay connection error: {}", e);
                    break;
                }
            };

            let signal = match parsed {
                Ok(signal) => signal,
                Err(e) => {
                    warn!("Invalid relay message: {}", e);
                    continue;
                }
            };

            if let SignalMessage::Welcome { peer_id } = &signal {
                *local_id.write() = Some(peer_id.clone());
            }
            debug!("Relay -> {:?}", signal);

            if command_tx.send(RegistryCommand::Signal(signal)).await.is_err() {
                debug!("Mesh registry stopped, closing relay connection");
                break;
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    info!("Relay connection to {} closed", url);
}
