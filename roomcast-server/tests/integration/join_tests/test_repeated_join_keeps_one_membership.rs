use roomcast_core::{LogKind, ServerEvent};

use crate::integration::{create_test_relay, init_tracing, peer};

#[tokio::test]
async fn test_repeated_join_keeps_one_membership() {
    init_tracing();

    let t = create_test_relay();
    let c1 = t.connect().await;

    t.join(c1, "lobby", peer("ann"), 0).await;
    t.join(c1, "lobby", peer("ann again"), 0).await;
    let stats = t.settle().await;

    assert_eq!(stats.memberships, 1);

    let events = t.output.events_for(&c1).await;
    assert_eq!(events.len(), 2);
    let ServerEvent::Join(second) = &events[1] else {
        panic!("expected event:join, got {:?}", events[1]);
    };
    assert_eq!(second.peers, vec![Some(peer("ann again"))]);

    // The repeated attempt is still processed and logged.
    assert_eq!(
        t.store.kinds("lobby"),
        vec![
            LogKind::OnJoin,
            LogKind::EventJoin,
            LogKind::OnJoin,
            LogKind::EventJoin
        ]
    );
}

#[tokio::test]
async fn test_reannouncement_applies_to_every_room() {
    init_tracing();

    let t = create_test_relay();
    let c1 = t.connect().await;
    let c2 = t.connect().await;

    t.join(c2, "red", peer("bob"), 0).await;
    t.join(c1, "red", peer("ann"), 0).await;
    t.join(c1, "blue", peer("ann v2"), 0).await;
    t.output.clear().await;

    t.dispatch(
        c2,
        roomcast_core::ClientEvent::Peers(roomcast_core::RoomRequest {
            room: "red".to_string(),
        }),
    )
    .await;
    t.settle().await;

    let events = t.output.events_for(&c2).await;
    let ServerEvent::Peers(roster) = &events[0] else {
        panic!("expected event:peers, got {:?}", events[0]);
    };
    assert_eq!(roster.peers, vec![Some(peer("bob")), Some(peer("ann v2"))]);
}

#[tokio::test]
async fn test_peers_length_matches_membership() {
    init_tracing();

    let t = create_test_relay();
    let mut conns = Vec::new();
    for i in 0..5 {
        let conn = t.connect().await;
        t.join(conn, "lobby", peer(&format!("p{i}")), 0).await;
        conns.push(conn);
    }
    let stats = t.settle().await;

    let last = conns[4];
    let events = t.output.events_for(&last).await;
    let ServerEvent::Join(join) = &events[0] else {
        panic!("expected event:join");
    };
    assert_eq!(join.peers.len(), stats.memberships);
    assert!(join.peers.contains(&Some(peer("p4"))));

    // Every member saw the last join.
    for conn in &conns {
        let seen = t.output.events_for(conn).await;
        assert!(matches!(seen.last(), Some(ServerEvent::Join(j)) if j.peers.len() == 5));
    }
}
