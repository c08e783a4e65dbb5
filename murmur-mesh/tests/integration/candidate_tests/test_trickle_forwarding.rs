use murmur_core::{IceDto, SignalMessage};
use murmur_mesh::HandshakeState;

use crate::integration::{create_connected_pair, init_tracing};

#[tokio::test]
async fn test_local_candidates_reach_the_peer() {
    init_tracing();

    let (mut mesh, alice, bob) = create_connected_pair().await;

    mesh.network.emit_candidate(&alice, &bob, "cand-1");
    mesh.network.emit_candidate(&bob, &alice, "cand-2");
    mesh.settle().await;

    assert_eq!(mesh.relay.candidates_to(&bob), vec!["cand-1".to_owned()]);
    assert_eq!(mesh.relay.candidates_to(&alice), vec!["cand-2".to_owned()]);
    assert_eq!(mesh.network.applied_candidates(&bob, &alice), vec!["cand-1".to_owned()]);
    assert_eq!(mesh.network.applied_candidates(&alice, &bob), vec!["cand-2".to_owned()]);
}

#[tokio::test]
async fn test_bad_candidate_is_not_fatal() {
    init_tracing();

    let (mut mesh, alice, bob) = create_connected_pair().await;

    mesh.relay.deliver(
        &alice,
        SignalMessage::Ice(IceDto {
            from_client_id: bob.clone(),
            to_client_id: alice.clone(),
            ice: "bad".into(),
        }),
    );
    mesh.settle().await;

    assert_eq!(mesh.get(&alice).handshake(&bob), Some(HandshakeState::Connected));
    assert!(mesh.network.applied_candidates(&alice, &bob).is_empty());
}
