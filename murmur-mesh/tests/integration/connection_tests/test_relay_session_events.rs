use murmur_core::utils::DEFAULT_STUN_ADDR;
use murmur_core::{IceServerConfig, SignalMessage};
use murmur_mesh::TransportConfig;

use crate::integration::{create_connected_pair, init_tracing};
use crate::utils::TestMesh;

fn turn_server() -> IceServerConfig {
    IceServerConfig {
        urls: vec!["turn:relay.example.net:3478".to_owned()],
        username: Some("murmur".to_owned()),
        credential: Some("secret".to_owned()),
    }
}

#[tokio::test]
async fn test_empty_ice_config_keeps_current_servers() {
    init_tracing();

    let mut mesh = TestMesh::new();
    let alice = mesh.add("alice");
    mesh.relay.deliver(
        &alice,
        SignalMessage::IceConfig {
            ice_servers: vec![turn_server()],
        },
    );
    mesh.settle().await;

    mesh.relay
        .deliver(&alice, SignalMessage::IceConfig { ice_servers: vec![] });
    mesh.settle().await;

    assert_eq!(
        mesh.get(&alice).registry.transport_config().ice_servers,
        vec![turn_server()]
    );
}

#[tokio::test]
async fn test_ice_config_applies_to_later_connections() {
    init_tracing();

    let mut mesh = TestMesh::new();
    let alice = mesh.add("alice");
    let bob = mesh.add("bob");
    let carol = mesh.add("carol");
    mesh.join(&alice, "lobby").await;
    mesh.join(&bob, "lobby").await;

    mesh.relay.deliver(
        &alice,
        SignalMessage::IceConfig {
            ice_servers: vec![turn_server()],
        },
    );
    mesh.settle().await;
    mesh.join(&carol, "lobby").await;

    assert_eq!(
        mesh.network.ice_urls(&alice, &bob),
        vec![DEFAULT_STUN_ADDR.to_owned()],
        "existing connection keeps the servers it was built with"
    );
    assert_eq!(
        mesh.network.ice_urls(&alice, &carol),
        vec!["turn:relay.example.net:3478".to_owned()]
    );
    assert_eq!(
        mesh.get(&bob).registry.transport_config(),
        &TransportConfig::default()
    );
}

#[tokio::test]
async fn test_welcome_drops_entry_carrying_own_id() {
    init_tracing();

    let (mut mesh, alice, bob) = create_connected_pair().await;
    assert_eq!(mesh.get(&alice).registry.peer_ids(), vec![bob.clone()]);

    // The relay hands alice the id her entry for bob is keyed by.
    mesh.relay.deliver(
        &alice,
        SignalMessage::Welcome {
            peer_id: bob.clone(),
        },
    );
    mesh.settle().await;

    let registry = &mesh.get(&alice).registry;
    assert_eq!(registry.local_id(), Some(&bob));
    assert_eq!(registry.peer_count(), 0);
    assert_eq!(mesh.network.close_count(&alice, &bob), 1);
    assert_eq!(mesh.get(&alice).observer.count_removed(&bob).await, 1);
    assert_eq!(mesh.get(&alice).registry.context().local_id(), Some(bob.clone()));
}
