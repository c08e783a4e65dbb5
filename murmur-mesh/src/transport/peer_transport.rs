use crate::transport::{ConnectionId, RemoteAudio, TransportConfig, TransportEvent};
use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;
use murmur_core::PeerId;
use std::sync::Arc;
use tokio::sync::mpsc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionDescription {
    Offer(String),
    Answer(String),
}

/// One direct connection to one remote participant.
///
/// Implementations report asynchronous happenings (state changes, local
/// candidates, incoming snapshots) through the event sender they were
/// created with, never by calling back into the registry. Posting never
/// waits, so a transport can be closed while the registry is not draining.
#[async_trait]
pub trait PeerTransport: Send + Sync {
    /// Creates an offer and installs it as the local description.
    async fn create_offer(&self) -> Result<String>;

    /// Creates an answer and installs it as the local description.
    async fn create_answer(&self) -> Result<String>;

    async fn set_remote_description(&self, description: SessionDescription) -> Result<()>;

    /// `candidate` is the JSON candidate init received through the relay.
    async fn add_ice_candidate(&self, candidate: String) -> Result<()>;

    fn is_channel_open(&self) -> bool;

    async fn send(&self, data: Bytes) -> Result<()>;

    fn audio(&self) -> Arc<RemoteAudio>;

    async fn close(&self) -> Result<()>;
}

#[async_trait]
pub trait TransportFactory: Send + Sync {
    async fn create(
        &self,
        peer_id: PeerId,
        connection: ConnectionId,
        config: &TransportConfig,
        events: mpsc::UnboundedSender<TransportEvent>,
    ) -> Result<Box<dyn PeerTransport>>;
}
