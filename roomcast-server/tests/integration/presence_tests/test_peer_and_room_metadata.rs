use roomcast_core::{DEFAULT_ROOM, LogKind, ServerEvent};
use serde_json::json;

use crate::integration::{create_test_relay, init_tracing, peer};

#[tokio::test]
async fn test_set_peer_updates_every_room() {
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

    t.set_peer(c1, peer("ann (away)")).await;
    let stats = t.settle().await;

    for (conn, room, other) in [(c2, "red", "bob"), (c3, "blue", "cat")] {
        let events = t.output.events_for(&conn).await;
        assert_eq!(events.len(), 1, "{room}: {events:?}");
        let ServerEvent::PeerUpdate(update) = &events[0] else {
            panic!("expected event:peer-update, got {:?}", events[0]);
        };
        assert_eq!(update.room, room);
        assert_eq!(update.peer, Some(peer("ann (away)")));
        assert_eq!(update.peers, vec![Some(peer("ann (away)")), Some(peer(other))]);

        let records = t.store.records(room);
        let n = records.len();
        assert_eq!(records[n - 2].kind, LogKind::OnSetPeer);
        assert_eq!(records[n - 2].peer, Some(peer("ann")));
        assert_eq!(records[n - 2].data, json!({"peer": peer("ann (away)")}));
        assert_eq!(records[n - 1].kind, LogKind::EventPeerUpdate);
    }
    assert_eq!(t.output.events_for(&c1).await.len(), 2);
    assert_eq!(stats.memberships, 4);
}

#[tokio::test]
async fn test_set_peer_outside_rooms_is_remembered() {
    init_tracing();

    let t = create_test_relay();
    let c1 = t.connect().await;
    let c2 = t.connect().await;
    t.join(c2, "lobby", peer("bob"), 0).await;
    t.output.clear().await;

    t.set_peer(c1, peer("eve")).await;
    t.broadcast(c1, "lobby", json!("hello")).await;
    t.settle().await;

    assert_eq!(t.store.kinds(DEFAULT_ROOM), vec![LogKind::OnSetPeer]);
    let events = t.output.events_for(&c2).await;
    assert_eq!(events.len(), 1);
    let ServerEvent::Broadcast(event) = &events[0] else {
        panic!("expected event:broadcast, got {:?}", events[0]);
    };
    assert_eq!(event.peer, Some(peer("eve")));
}

#[tokio::test]
async fn test_room_metadata_is_announced_and_welcomed() {
    init_tracing();

    let t = create_test_relay();
    let c1 = t.connect().await;
    let c2 = t.connect().await;

    t.join(c1, "lobby", peer("ann"), 0).await;
    t.output.clear().await;

    t.set_room_metadata(c1, "lobby", json!({"topic": "rust"})).await;
    t.join(c2, "lobby", peer("bob"), 0).await;
    t.settle().await;

    let seen_by_c1 = t.output.events_for(&c1).await;
    let ServerEvent::RoomMetadata(update) = &seen_by_c1[0] else {
        panic!("expected event:room-metadata, got {:?}", seen_by_c1[0]);
    };
    assert_eq!(update.room, "lobby");
    assert_eq!(update.metadata, json!({"topic": "rust"}));
    assert_eq!(update.peer, Some(peer("ann")));

    let seen_by_c2 = t.output.events_for(&c2).await;
    assert_eq!(seen_by_c2.len(), 2);
    let ServerEvent::Welcome(welcome) = &seen_by_c2[0] else {
        panic!("expected event:welcome first, got {:?}", seen_by_c2[0]);
    };
    assert_eq!(welcome.room, "lobby");
    assert_eq!(welcome.metadata, json!({"topic": "rust"}));
    assert!(matches!(&seen_by_c2[1], ServerEvent::Join(_)));

    let kinds = t.store.kinds("lobby");
    assert_eq!(
        &kinds[2..],
        &[
            LogKind::OnSetRoomMetadata,
            LogKind::EventRoomMetadata,
            LogKind::OnJoin,
            LogKind::EventJoin
        ]
    );
}

#[tokio::test]
async fn test_cleared_room_metadata_sends_no_welcome() {
    init_tracing();

    let t = create_test_relay();
    let c1 = t.connect().await;
    let c2 = t.connect().await;

    t.set_room_metadata(c1, "lobby", json!("draft")).await;
    t.set_room_metadata(c1, "lobby", serde_json::Value::Null).await;
    t.join(c2, "lobby", peer("bob"), 0).await;
    t.settle().await;

    let events = t.output.events_for(&c2).await;
    assert_eq!(events.len(), 1);
    assert!(matches!(&events[0], ServerEvent::Join(_)));
    assert!(t.output.events_for(&c1).await.is_empty());
}

#[tokio::test]
async fn test_room_metadata_survives_empty_room() {
    init_tracing();

    let t = create_test_relay();
    let c1 = t.connect().await;
    let c2 = t.connect().await;

    t.join(c1, "lobby", peer("ann"), 0).await;
    t.set_room_metadata(c1, "lobby", json!({"topic": "rust"})).await;
    t.leave(c1, "lobby").await;
    t.join(c2, "lobby", peer("bob"), 0).await;
    t.settle().await;

    let events = t.output.events_for(&c2).await;
    assert!(matches!(&events[0], ServerEvent::Welcome(w) if w.metadata == json!({"topic": "rust"})));
}
