use std::time::Duration;

use murmur_core::PeerId;

use crate::integration::{create_connected_pair, init_tracing};
use crate::utils::{LOOP_TIMEOUT_MS, TestMesh};

/// More snapshots than a frame-rate burst from a large room would queue.
const BURST: usize = 1000;

fn snapshot(x: usize) -> Vec<u8> {
    format!(
        r#"{{"nickname":"n","idx":0,"centerPos":{{"x":{},"y":0}},"rotateRadian":0,"volume":0}}"#,
        x
    )
    .into_bytes()
}

fn flood(mesh: &TestMesh, from: &PeerId, to: &PeerId) {
    for x in 0..BURST {
        mesh.network.deliver_raw(from, to, &snapshot(x));
    }
}

#[tokio::test]
async fn test_snapshot_burst_is_not_dropped() {
    init_tracing();

    let (mut mesh, alice, bob) = create_connected_pair().await;
    flood(&mesh, &bob, &alice);
    mesh.settle().await;

    let ctx = mesh.get(&alice).registry.context();
    assert_eq!(ctx.position(&bob).map(|p| p.x), Some((BURST - 1) as f64));
    assert_eq!(mesh.get(&alice).observer.count_updated(&bob).await, BURST);
}

#[tokio::test]
async fn test_shutdown_with_full_queues_completes() {
    init_tracing();

    let (mut mesh, alice, bob) = create_connected_pair().await;
    flood(&mesh, &bob, &alice);
    flood(&mesh, &alice, &bob);

    // Close while both inboxes still hold the whole burst.
    let shutdown = mesh.get_mut(&alice).registry.shutdown();
    tokio::time::timeout(Duration::from_millis(LOOP_TIMEOUT_MS), shutdown)
        .await
        .expect("shutdown waited on its own queue");
    mesh.settle().await;

    assert_eq!(mesh.get(&alice).registry.peer_count(), 0);
    assert_eq!(mesh.get(&alice).observer.count_removed(&bob).await, 1);

    assert_eq!(mesh.get(&bob).registry.peer_count(), 0);
    assert_eq!(mesh.get(&bob).observer.count_removed(&alice).await, 1);
    assert_eq!(mesh.network.close_count(&alice, &bob), 1);
    assert_eq!(mesh.network.close_count(&bob, &alice), 1);
}
