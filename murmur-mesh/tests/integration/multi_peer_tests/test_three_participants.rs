use murmur_core::PeerId;
use murmur_mesh::ConnectionState;

use crate::integration::init_tracing;
use crate::utils::TestMesh;

#[tokio::test]
async fn test_full_mesh_of_three() {
    init_tracing();

    let mut mesh = TestMesh::new();
    let alice = mesh.add("alice");
    let bob = mesh.add("bob");
    let carol = mesh.add("carol");

    mesh.join(&alice, "lobby").await;
    mesh.join(&bob, "lobby").await;
    mesh.join(&carol, "lobby").await;

    let mut offers = mesh.relay.offers();
    offers.sort();
    assert_eq!(
        offers,
        vec![
            (bob.clone(), alice.clone()),
            (carol.clone(), alice.clone()),
            (carol.clone(), bob.clone()),
        ]
    );
    assert_eq!(mesh.relay.answers().len(), 3);

    for p in &mesh.participants {
        let expected: Vec<PeerId> = [&alice, &bob, &carol]
            .into_iter()
            .filter(|id| **id != p.id)
            .cloned()
            .collect();
        assert_eq!(p.connected_peers(), expected, "mesh of {}", p.id);
    }
}

#[tokio::test]
async fn test_one_leaves_others_stay() {
    init_tracing();

    let mut mesh = TestMesh::new();
    let alice = mesh.add("alice");
    let bob = mesh.add("bob");
    let carol = mesh.add("carol");
    mesh.join(&alice, "lobby").await;
    mesh.join(&bob, "lobby").await;
    mesh.join(&carol, "lobby").await;

    // Carol's network drops out.
    mesh.network.emit_state(&carol, &alice, ConnectionState::Failed);
    mesh.network.emit_state(&carol, &bob, ConnectionState::Failed);
    mesh.settle().await;

    assert_eq!(mesh.get(&carol).registry.peer_count(), 0);
    assert_eq!(mesh.get(&alice).connected_peers(), vec![bob.clone()]);
    assert_eq!(mesh.get(&bob).connected_peers(), vec![alice.clone()]);
    assert_eq!(mesh.get(&alice).observer.count_removed(&carol).await, 1);
}
