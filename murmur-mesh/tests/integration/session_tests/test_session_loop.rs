use std::sync::Arc;

use murmur_core::{PeerId, Position};
use murmur_mesh::{
    HandshakeState, MeshError, MeshHandle, MeshSession, Microphone, NoopObserver,
    SessionConfig, SignalingOutput,
};

use crate::integration::init_tracing;
use crate::utils::{LOOP_TIMEOUT_MS, MemoryRelay, MockNetwork, TestMeshObserver, wait_until};

async fn start(
    relay: &MemoryRelay,
    network: &MockNetwork,
    name: &str,
    observer: TestMeshObserver,
) -> MeshHandle {
    let id = PeerId::from(name);
    let config = SessionConfig {
        nickname: name.to_owned(),
        ..Default::default()
    };
    let relay = relay.clone();
    let port_id = id.clone();

    MeshSession::start(
        config,
        Microphone::new(),
        network.factory(&id),
        move |command_tx| Arc::new(relay.attach(&port_id, command_tx)) as Arc<dyn SignalingOutput>,
        Box::new(observer),
    )
    .await
    .expect("session should start")
}

#[tokio::test]
async fn test_spawned_sessions_connect_and_sync() {
    init_tracing();

    let relay = MemoryRelay::new();
    let network = MockNetwork::new();
    let alice_id = PeerId::from("alice");
    let bob_id = PeerId::from("bob");

    let alice_observer = TestMeshObserver::new();
    let alice = start(&relay, &network, "alice", alice_observer.clone()).await;
    let bob = start(&relay, &network, "bob", TestMeshObserver::new()).await;

    let (a, b) = (alice.context().clone(), bob.context().clone());
    assert!(
        wait_until(
            || a.handshake(&bob_id) == Some(HandshakeState::Connected)
                && b.handshake(&alice_id) == Some(HandshakeState::Connected),
            LOOP_TIMEOUT_MS,
        )
        .await,
        "sessions should connect"
    );
    assert_eq!(a.local_id(), Some(alice_id.clone()));

    bob.pointer_down(Position::new(0.0, 0.0)).await.expect("pointer");
    bob.pointer_move(Position::new(0.0, -1.0)).await.expect("pointer");
    bob.tick(50.0).await.expect("tick");

    assert!(
        wait_until(
            || a.position(&bob_id) == Some(Position::new(0.0, -10.0)),
            LOOP_TIMEOUT_MS,
        )
        .await,
        "bob's movement should reach alice"
    );
    assert_eq!(a.nickname(&bob_id).as_deref(), Some("bob"));

    bob.shutdown().await;
    assert!(
        wait_until(|| !a.is_connection_alive(&bob_id), LOOP_TIMEOUT_MS).await,
        "alice should drop bob after he leaves"
    );
    assert_eq!(alice_observer.count_removed(&bob_id).await, 1);

    alice.shutdown().await;
}

#[tokio::test]
async fn test_invalid_config_starts_nothing() {
    init_tracing();

    let relay = MemoryRelay::new();
    let network = MockNetwork::new();
    let id = PeerId::from("alice");
    let config = SessionConfig {
        velocity: -1.0,
        ..Default::default()
    };

    let relay_for_port = relay.clone();
    let result = MeshSession::start(
        config,
        Microphone::new(),
        network.factory(&id),
        move |tx| Arc::new(relay_for_port.attach(&id, tx)) as Arc<dyn SignalingOutput>,
        Box::new(NoopObserver),
    )
    .await;

    assert!(matches!(result, Err(MeshError::InvalidConfig(_))));
    assert!(relay.log().is_empty());
}
