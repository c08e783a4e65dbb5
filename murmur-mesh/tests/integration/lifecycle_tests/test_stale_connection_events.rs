use murmur_mesh::{ConnectionState, HandshakeState};

use crate::integration::{create_connected_pair, init_tracing};

#[tokio::test]
async fn test_old_connection_cannot_touch_its_replacement() {
    init_tracing();

    let (mut mesh, alice, bob) = create_connected_pair().await;
    let old = mesh
        .get(&alice)
        .registry
        .peer(&bob)
        .expect("entry for bob")
        .connection();

    mesh.network.emit_state(&alice, &bob, ConnectionState::Failed);
    mesh.settle().await;
    assert_eq!(mesh.get(&alice).registry.peer_count(), 0);

    // A late candidate from the dead connection goes nowhere.
    mesh.network.emit_candidate(&alice, &bob, "late");
    mesh.settle().await;
    assert!(mesh.relay.candidates_to(&bob).is_empty());

    // Bob comes back and renegotiates.
    mesh.join(&bob, "lobby").await;
    let new = mesh
        .get(&alice)
        .registry
        .peer(&bob)
        .expect("entry for bob")
        .connection();
    assert_ne!(old, new);
    assert_eq!(mesh.get(&alice).handshake(&bob), Some(HandshakeState::Connected));

    mesh.network
        .emit_state_for(&alice, &bob, old, ConnectionState::Closed);
    mesh.settle().await;

    assert_eq!(mesh.get(&alice).handshake(&bob), Some(HandshakeState::Connected));
    assert_eq!(mesh.get(&alice).observer.count_removed(&bob).await, 1);
    assert_eq!(mesh.get(&alice).observer.count_created(&bob).await, 2);
}
