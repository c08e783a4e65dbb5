use murmur_mesh::RegistryCommand;

use crate::integration::init_tracing;
use crate::utils::TestMesh;

#[tokio::test]
async fn test_shutdown_closes_every_connection() {
    init_tracing();

    let mut mesh = TestMesh::new();
    let alice = mesh.add("alice");
    let bob = mesh.add("bob");
    let carol = mesh.add("carol");
    mesh.join(&alice, "lobby").await;
    mesh.join(&bob, "lobby").await;
    mesh.join(&carol, "lobby").await;
    assert_eq!(mesh.get(&alice).connected_peers().len(), 2);

    mesh.send(&alice, RegistryCommand::Shutdown).await;
    mesh.settle().await;

    let alice_p = mesh.get(&alice);
    assert_eq!(alice_p.registry.peer_count(), 0);
    assert_eq!(alice_p.observer.count_removed(&bob).await, 1);
    assert_eq!(alice_p.observer.count_removed(&carol).await, 1);
    assert_eq!(mesh.network.close_count(&alice, &bob), 1);
    assert_eq!(mesh.network.close_count(&alice, &carol), 1);

    // The others drop alice but keep each other.
    assert_eq!(mesh.get(&bob).connected_peers(), vec![carol.clone()]);
    assert_eq!(mesh.get(&carol).connected_peers(), vec![bob.clone()]);
}
