use roomcast_core::ServerEvent;
use serde_json::json;
use std::time::Duration;

use crate::integration::{create_test_relay, init_tracing, peer};
use crate::utils::broadcasts;

#[tokio::test]
async fn test_read_failure_skips_only_replay() {
    init_tracing();

    let t = create_test_relay();
    let c1 = t.connect().await;
    let c2 = t.connect().await;

    t.join(c1, "lobby", peer("ann"), 0).await;
    t.broadcast(c1, "lobby", json!("hi")).await;
    t.settle().await;

    t.store.set_fail_reads(true);
    t.join(c2, "lobby", peer("bob"), 10).await;
    t.settle().await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    let events = t.output.events_for(&c2).await;
    assert_eq!(events.len(), 1);
    assert!(matches!(&events[0], ServerEvent::Join(j) if j.peers.len() == 2));
}

#[tokio::test]
async fn test_append_failure_still_delivers_live() {
    init_tracing();

    let t = create_test_relay();
    t.store.set_fail_appends(true);

    let c1 = t.connect().await;
    let c2 = t.connect().await;
    t.join(c1, "lobby", peer("ann"), 10).await;
    t.join(c2, "lobby", peer("bob"), 10).await;
    t.broadcast(c1, "lobby", json!("still here")).await;
    t.settle().await;

    assert!(t.store.lines("lobby").is_empty());
    assert_eq!(
        broadcasts(&t.output.events_for(&c2).await),
        vec![(json!("still here"), true)]
    );

    // The relay keeps working once storage recovers.
    t.store.set_fail_appends(false);
    t.broadcast(c2, "lobby", json!("back")).await;
    t.settle().await;
    assert_eq!(t.store.lines("lobby").len(), 2);
}
