use crate::config::SessionConfig;
use crate::error::MeshError;
use crate::local::Microphone;
use crate::registry::{MeshContext, MeshObserver, PeerRegistry, RegistryCommand};
use crate::signaling::{RelayClient, SignalingOutput};
use crate::transport::{TransportFactory, WebRtcTransportFactory};
use murmur_core::{Position, RoomId};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::info;

/// Control surface of a running mesh. Every call is a message to the
/// registry loop.
pub struct MeshHandle {
    command_tx: mpsc::Sender<RegistryCommand>,
    context: MeshContext,
    microphone: Microphone,
    task: JoinHandle<()>,
}

impl MeshHandle {
    pub fn context(&self) -> &MeshContext {
        &self.context
    }

    pub fn microphone(&self) -> &Microphone {
        &self.microphone
    }

    async fn send(&self, cmd: RegistryCommand) -> Result<(), MeshError> {
        self.command_tx
            .send(cmd)
            .await
            .map_err(|_| MeshError::SessionClosed)
    }

    pub async fn join(&self, room: RoomId) -> Result<(), MeshError> {
        self.send(RegistryCommand::Join { room }).await
    }

    pub async fn tick(&self, elapsed_ms: f64) -> Result<(), MeshError> {
        self.send(RegistryCommand::Tick { elapsed_ms }).await
    }

    pub async fn pointer_down(&self, at: Position) -> Result<(), MeshError> {
        self.send(RegistryCommand::PointerDown(at)).await
    }

    pub async fn pointer_move(&self, at: Position) -> Result<(), MeshError> {
        self.send(RegistryCommand::PointerMove(at)).await
    }

    pub async fn pointer_up(&self) -> Result<(), MeshError> {
        self.send(RegistryCommand::PointerUp).await
    }

    pub async fn set_profile(&self, avatar: u32, nickname: String) -> Result<(), MeshError> {
        self.send(RegistryCommand::SetProfile { avatar, nickname })
            .await
    }

    pub async fn set_mic_enabled(&self, enabled: bool) -> Result<(), MeshError> {
        self.send(RegistryCommand::SetMicEnabled(enabled)).await
    }

    /// Closes every connection and waits for the loop to finish.
    pub async fn shutdown(self) {
        let _ = self.command_tx.send(RegistryCommand::Shutdown).await;
        let _ = self.task.await;
    }
}

pub struct MeshSession;

impl MeshSession {
    /// Spawns the registry loop and joins the configured room.
    ///
    /// `signaling` receives the loop's command sender so relay traffic can
    /// be delivered back into it.
    pub async fn start<S>(
        config: SessionConfig,
        microphone: Microphone,
        factory: Arc<dyn TransportFactory>,
        signaling: S,
        observer: Box<dyn MeshObserver>,
    ) -> Result<MeshHandle, MeshError>
    where
        S: FnOnce(mpsc::Sender<RegistryCommand>) -> Arc<dyn SignalingOutput>,
    {
        config.validate()?;

        let (command_tx, command_rx) = mpsc::channel(256);
        let signaling = signaling(command_tx.clone());

        let registry = PeerRegistry::new(
            &config,
            microphone.clone(),
            factory,
            signaling,
            observer,
            command_rx,
        );
        let context = registry.context();

        let task = tokio::spawn(registry.run());

        let handle = MeshHandle {
            command_tx,
            context,
            microphone,
            task,
        };
        handle.join(config.room.clone()).await?;

        info!("Mesh session started in room '{}'", config.room);
        Ok(handle)
    }

    /// WebRTC transports and a websocket relay at `relay_url`.
    pub async fn connect(
        config: SessionConfig,
        relay_url: &str,
        microphone: Microphone,
        observer: Box<dyn MeshObserver>,
    ) -> Result<MeshHandle, MeshError> {
        config.validate()?;

        let factory = Arc::new(WebRtcTransportFactory::new(microphone.clone())?);
        let url = relay_url.to_owned();
        let signaling = move |command_tx| {
            Arc::new(RelayClient::spawn(url, command_tx)) as Arc<dyn SignalingOutput>
        };

        Self::start(config, microphone, factory, signaling, observer).await
    }
}
