use roomcast_core::{DEFAULT_ROOM, LogKind, ServerEvent};
use serde_json::json;

use crate::integration::{create_test_relay, init_tracing, peer};

#[tokio::test]
async fn test_disconnect_notifies_every_room() {
    init_tracing();

    let t = create_test_relay();
    let c1 = t.connect().await;
    let c2 = t.connect().await;
    let c3 = t.connect().await;

    t.join(c1, "red", peer("ann"), 0).await;
    t.join(c1, "blue", peer("ann"), 0).await;
    t.join(c2, "red", peer("bob"), 0).await;
    t.join(c3, "blue", peer("cat"), 0).await;
    t.output.clear().await;

    t.close(c1, "transport close").await;
    let stats = t.settle().await;

    for (conn, room, remaining) in [(c2, "red", "bob"), (c3, "blue", "cat")] {
        let events = t.output.events_for(&conn).await;
        assert_eq!(events.len(), 1, "{room}: {events:?}");
        let ServerEvent::Disconnect(event) = &events[0] else {
            panic!("expected event:disconnect, got {:?}", events[0]);
        };
        assert_eq!(event.room, room);
        assert_eq!(event.peer, Some(peer("ann")));
        assert_eq!(event.peers, vec![Some(peer(remaining))]);

        let kinds = t.store.kinds(room);
        assert_eq!(
            &kinds[kinds.len() - 2..],
            &[LogKind::OnDisconnecting, LogKind::EventDisconnect]
        );
        let records = t.store.records(room);
        assert_eq!(records[records.len() - 2].data, json!({"reason": "transport close"}));
    }
    assert!(t.output.events_for(&c1).await.is_empty());

    assert_eq!(t.store.kinds(DEFAULT_ROOM), vec![LogKind::OnDisconnect]);
    assert_eq!(stats.connections, 2);
    assert_eq!(stats.memberships, 2);
}

#[tokio::test]
async fn test_disconnect_forgets_presence() {
    init_tracing();

    let t = create_test_relay();
    let c1 = t.connect().await;
    let c2 = t.connect().await;

    t.join(c1, "red", peer("ann"), 0).await;
    t.join(c2, "red", peer("bob"), 0).await;
    t.close(c1, "ping timeout").await;
    t.output.clear().await;

    // A late frame from the dead connection no longer carries its descriptor.
    t.broadcast(c1, "red", json!("ghost")).await;
    let stats = t.settle().await;

    let events = t.output.events_for(&c2).await;
    let ServerEvent::Broadcast(event) = &events[0] else {
        panic!("expected event:broadcast, got {:?}", events[0]);
    };
    assert_eq!(event.peer, None);
    assert_eq!(stats.rooms, 1);
}

#[tokio::test]
async fn test_last_member_leaving_retires_room() {
    init_tracing();

    let t = create_test_relay();
    let c1 = t.connect().await;

    t.join(c1, "solo", peer("ann"), 0).await;
    t.close(c1, "client namespace disconnect").await;
    let stats = t.settle().await;

    assert_eq!(stats.rooms, 0);
    assert_eq!(stats.memberships, 0);
    assert_eq!(stats.connections, 0);
    // The stream outlives the membership set.
    assert_eq!(t.store.lines("solo").len(), 4);
}
