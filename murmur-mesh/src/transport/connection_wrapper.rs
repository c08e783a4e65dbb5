use crate::error::MeshError;
use crate::local::Microphone;
use crate::transport::{
    ConnectionId, ConnectionState, PeerTransport, RemoteAudio, SessionDescription,
    TransportConfig, TransportEvent, TransportFactory,
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use bytes::Bytes;
use murmur_core::PeerId;
use murmur_core::utils::STATE_CHANNEL_LABEL;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info};
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine;
use webrtc::api::{API, APIBuilder};
use webrtc::data_channel::RTCDataChannel;
use webrtc::data_channel::data_channel_message::DataChannelMessage;
use webrtc::data_channel::data_channel_state::RTCDataChannelState;
use webrtc::ice_transport::ice_candidate::{RTCIceCandidate, RTCIceCandidateInit};
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::track::track_local::TrackLocal;
use webrtc::track::track_remote::TrackRemote;

/// Builds WebRTC connections that carry the local microphone track.
pub struct WebRtcTransportFactory {
    api: API,
    microphone: Microphone,
}

impl WebRtcTransportFactory {
    /// Fails when the media engine cannot register its codecs or interceptors.
    pub fn new(microphone: Microphone) -> Result<Self, MeshError> {
        let mut m = MediaEngine::default();
        m.register_default_codecs()
            .map_err(|e| MeshError::Media(e.to_string()))?;
        let registry = register_default_interceptors(Registry::new(), &mut m)
            .map_err(|e| MeshError::Media(e.to_string()))?;

        let api = APIBuilder::new()
            .with_media_engine(m)
            .with_interceptor_registry(registry)
            .build();

        Ok(Self { api, microphone })
    }
}

#[async_trait]
impl TransportFactory for WebRtcTransportFactory {
    async fn create(
        &self,
        peer_id: PeerId,
        connection: ConnectionId,
        config: &TransportConfig,
        events: mpsc::UnboundedSender<TransportEvent>,
    ) -> Result<Box<dyn PeerTransport>> {
        let transport = WebRtcTransport::new(
            &self.api,
            peer_id,
            connection,
            config,
            &self.microphone,
            events,
        )
        .await?;
        Ok(Box::new(transport))
    }
}

pub struct WebRtcTransport {
    pub peer_id: PeerId,
    pub connection: ConnectionId,
    pub peer_connection: Arc<RTCPeerConnection>,
    data_channel: Arc<RTCDataChannel>,
    audio: Arc<RemoteAudio>,
}

impl WebRtcTransport {
    /// Opens a peer connection with the microphone track and an outbound
    /// state channel attached. Callbacks only forward into `event_tx`.
    pub async fn new(
        api: &API,
        peer_id: PeerId,
        connection: ConnectionId,
        config: &TransportConfig,
        microphone: &Microphone,
        event_tx: mpsc::UnboundedSender<TransportEvent>,
    ) -> Result<Self> {
        let rtc_config = RTCConfiguration {
            ice_servers: config
                .ice_servers
                .iter()
                .map(|server| RTCIceServer {
                    urls: server.urls.clone(),
                    username: server.username.clone().unwrap_or_default(),
                    credential: server.credential.clone().unwrap_or_default(),
                })
                .collect(),
            ..Default::default()
        };

        let peer_connection = Arc::new(api.new_peer_connection(rtc_config).await?);
        let audio = Arc::new(RemoteAudio::new());

        let rtp_sender = peer_connection
            .add_track(microphone.track() as Arc<dyn TrackLocal + Send + Sync>)
            .await
            .context("Failed to add microphone track")?;

        // RTCP has to be drained for the interceptors to work.
        tokio::spawn(async move {
            let mut rtcp_buf = vec![0u8; 1500];
            while rtp_sender.read(&mut rtcp_buf).await.is_ok() {}
        });

        // Each side sends on its own channel and reads the one the peer opened.
        let data_channel = peer_connection
            .create_data_channel(STATE_CHANNEL_LABEL, None)
            .await
            .context("Failed to create state channel")?;

        let state_tx = event_tx.clone();
        let uid_state = peer_id.clone();
        peer_connection.on_peer_connection_state_change(Box::new(
            move |s: RTCPeerConnectionState| {
                let tx = state_tx.clone();
                let uid = uid_state.clone();

                Box::pin(async move {
                    info!("Peer connection {} for {} changed: {:?}", connection, uid, s);
                    // close() runs this handler inline, so it must not wait on the registry.
                    let _ = tx.send(TransportEvent::StateChanged(uid, connection, map_state(s)));
                })
            },
        ));

        let ice_tx = event_tx.clone();
        let uid_ice = peer_id.clone();
        peer_connection.on_ice_candidate(Box::new(move |c: Option<RTCIceCandidate>| {
            let tx = ice_tx.clone();
            let uid = uid_ice.clone();

            Box::pin(async move {
                let Some(candidate) = c else { return };
                let Ok(json_candidate) = candidate.to_json() else {
                    return;
                };
                let Ok(str_candidate) = serde_json::to_string(&json_candidate) else {
                    return;
                };
                let _ = tx.send(TransportEvent::CandidateGenerated(uid, connection, str_candidate));
            })
        }));

        let dc_tx = event_tx.clone();
        let uid_dc = peer_id.clone();
        peer_connection.on_data_channel(Box::new(move |dc: Arc<RTCDataChannel>| {
            let tx = dc_tx.clone();
            let uid = uid_dc.clone();

            Box::pin(async move {
                debug!("Incoming data channel '{}' from {}", dc.label(), uid);

                dc.on_message(Box::new(move |msg: DataChannelMessage| {
                    let tx = tx.clone();
                    let uid = uid.clone();
                    Box::pin(async move {
                        let _ = tx.send(TransportEvent::Message(uid, connection, msg.data));
                    })
                }));
            })
        }));

        let track_tx = event_tx;
        let uid_track = peer_id.clone();
        let track_audio = audio.clone();
        peer_connection.on_track(Box::new(move |track: Arc<TrackRemote>, _, _| {
            let tx = track_tx.clone();
            let uid = uid_track.clone();
            let audio = track_audio.clone();

            Box::pin(async move {
                debug!("Received {:?} track from {}", track.kind(), uid);
                audio.attach(track);
                let _ = tx.send(TransportEvent::TrackReceived(uid, connection));
            })
        }));

        Ok(Self {
            peer_id,
            connection,
            peer_connection,
            data_channel,
            audio,
        })
    }
}

#[async_trait]
impl PeerTransport for WebRtcTransport {
    async fn create_offer(&self) -> Result<String> {
        let offer = self.peer_connection.create_offer(None).await?;
        self.peer_connection
            .set_local_description(offer.clone())
            .await?;
        Ok(offer.sdp)
    }

    async fn create_answer(&self) -> Result<String> {
        let answer = self.peer_connection.create_answer(None).await?;
        self.peer_connection
            .set_local_description(answer.clone())
            .await?;
        Ok(answer.sdp)
    }

    async fn set_remote_description(&self, description: SessionDescription) -> Result<()> {
        let desc = match description {
            SessionDescription::Offer(sdp) => RTCSessionDescription::offer(sdp)?,
            SessionDescription::Answer(sdp) => RTCSessionDescription::answer(sdp)?,
        };
        self.peer_connection.set_remote_description(desc).await?;
        Ok(())
    }

    async fn add_ice_candidate(&self, candidate_json: String) -> Result<()> {
        let candidate: RTCIceCandidateInit =
            serde_json::from_str(&candidate_json).context("Failed to parse ICE candidate JSON")?;
        self.peer_connection.add_ice_candidate(candidate).await?;
        Ok(())
    }

    fn is_channel_open(&self) -> bool {
        self.data_channel.ready_state() == RTCDataChannelState::Open
    }

    async fn send(&self, data: Bytes) -> Result<()> {
        self.data_channel.send(&data).await?;
        Ok(())
    }

    fn audio(&self) -> Arc<RemoteAudio> {
        self.audio.clone()
    }

    async fn close(&self) -> Result<()> {
        self.peer_connection.close().await?;
        Ok(())
    }
}

fn map_state(state: RTCPeerConnectionState) -> ConnectionState {
    match state {
        RTCPeerConnectionState::Unspecified | RTCPeerConnectionState::New => ConnectionState::New,
        RTCPeerConnectionState::Connecting => ConnectionState::Connecting,
        RTCPeerConnectionState::Connected => ConnectionState::Connected,
        RTCPeerConnectionState::Disconnected => ConnectionState::Disconnected,
        RTCPeerConnectionState::Failed => ConnectionState::Failed,
        RTCPeerConnectionState::Closed => ConnectionState::Closed,
    }
}
