//! Room tasks, the registry and per-connection dispatch, end to end minus
//! the socket.

use lanewar_server::config::RoomPolicy;
use lanewar_server::error::GameError;
use lanewar_server::game::{
    dispatch::Connection, room::OUTBOX_CAPACITY, session::RoomRegistry, types::Side,
};
use lanewar_server::protocol::{ClientMsg, ServerMsg};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{channel, Receiver};
use tokio::time::{sleep, timeout};
use uuid::Uuid;

type Inbox = Receiver<ServerMsg>;

/// Next message that is not a periodic snapshot.
async fn next_event(rx: &mut Inbox) -> ServerMsg {
    loop {
        let msg = timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("timed out waiting for a message")
            .expect("outbox closed");
        if !matches!(msg, ServerMsg::State { .. }) {
            return msg;
        }
    }
}

async fn expect_silence(rx: &mut Inbox) {
    assert!(
        timeout(Duration::from_millis(150), rx.recv()).await.is_err(),
        "unexpected message"
    );
}

fn connect(registry: &Arc<RoomRegistry>) -> (Connection, Inbox) {
    let (tx, rx) = channel(OUTBOX_CAPACITY);
    (Connection::new(registry.clone(), tx), rx)
}

async fn joined_room(rx: &mut Inbox) -> (String, Side) {
    match next_event(rx).await {
        ServerMsg::Joined { room_id, role } => (room_id, role),
        other => panic!("expected joined, got {other:?}"),
    }
}

#[tokio::test]
async fn codes_are_matched_loosely() {
    let registry = RoomRegistry::new(RoomPolicy::default());
    let (tx_a, mut rx_a) = channel(OUTBOX_CAPACITY);
    let handle = registry.create(Uuid::new_v4(), tx_a);

    assert_eq!(handle.id.len(), 6);
    assert!(handle.id.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    assert!(registry.contains(&handle.id));
    assert_eq!(joined_room(&mut rx_a).await, (handle.id.clone(), Side::A));

    let (tx_b, mut rx_b) = channel(OUTBOX_CAPACITY);
    let code = format!("  {} ", handle.id.to_lowercase());
    let (joined, side) = registry.join(&code, Uuid::new_v4(), tx_b).await.unwrap();

    assert_eq!(joined.id, handle.id);
    assert_eq!(side, Side::B);
    assert_eq!(joined_room(&mut rx_b).await, (handle.id.clone(), Side::B));
    assert_eq!(
        next_event(&mut rx_a).await,
        ServerMsg::OpponentJoined { role: Side::B }
    );
}

#[tokio::test]
async fn full_and_unknown_rooms_are_refused() {
    let registry = RoomRegistry::new(RoomPolicy::default());
    let (tx, _rx_a) = channel(OUTBOX_CAPACITY);
    let handle = registry.create(Uuid::new_v4(), tx);
    let (tx, _rx_b) = channel(OUTBOX_CAPACITY);
    registry.join(&handle.id, Uuid::new_v4(), tx).await.unwrap();

    let (tx, _rx_c) = channel(OUTBOX_CAPACITY);
    let third = registry.join(&handle.id, Uuid::new_v4(), tx).await;
    assert!(matches!(third, Err(GameError::RoomFull)));

    let (tx, _rx_d) = channel(OUTBOX_CAPACITY);
    let missing = registry.join("ZZZZZZ", Uuid::new_v4(), tx).await;
    assert!(matches!(missing, Err(GameError::RoomNotFound)));
}

#[tokio::test]
async fn empty_room_shuts_down_and_unregisters() {
    let registry = RoomRegistry::new(RoomPolicy::default());
    let creator = Uuid::new_v4();
    let (tx, _rx) = channel(OUTBOX_CAPACITY);
    let handle = registry.create(creator, tx);
    assert_eq!(registry.len(), 1);

    handle.leave(creator).await;

    timeout(Duration::from_secs(2), async {
        while registry.contains(&handle.id) {
            sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("room never closed");
    assert!(registry.is_empty());

    let (tx, _rx) = channel(OUTBOX_CAPACITY);
    let late = registry.join(&handle.id, Uuid::new_v4(), tx).await;
    assert!(matches!(late, Err(GameError::RoomNotFound)));
}

#[tokio::test]
async fn snapshots_keep_flowing() {
    let registry = RoomRegistry::new(RoomPolicy::default());
    let (tx, mut rx) = channel(OUTBOX_CAPACITY);
    registry.create(Uuid::new_v4(), tx);

    let mut ticks = Vec::new();
    while ticks.len() < 3 {
        let msg = timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("timed out")
            .expect("outbox closed");
        if let ServerMsg::State { state, .. } = msg {
            ticks.push(state.tick);
        }
    }
    assert!(ticks.windows(2).all(|w| w[0] <= w[1]));
    assert!(ticks[2] >= 1);
}

#[tokio::test]
async fn malformed_and_unseated_messages_get_no_reply() {
    let registry = RoomRegistry::new(RoomPolicy::default());
    let (mut conn, mut rx) = connect(&registry);

    conn.handle_text("not json").await;
    conn.handle_text(r#"{"type":"teleport"}"#).await;
    conn.handle_text(r#"{"type":"spawn","unitType":"sword"}"#).await;
    conn.handle_text(r#"{"type":"mode","value":"attack"}"#).await;
    conn.handle_text(r#"{"type":"reset"}"#).await;

    expect_silence(&mut rx).await;
    assert!(conn.seat().is_none());
    assert!(registry.is_empty());
}

#[tokio::test]
async fn create_and_join_over_the_wire() {
    let registry = RoomRegistry::new(RoomPolicy::default());
    let (mut alice, mut rx_a) = connect(&registry);
    let (mut bob, mut rx_b) = connect(&registry);

    alice.handle_text(r#"{"type":"create"}"#).await;
    let (code, role) = joined_room(&mut rx_a).await;
    assert_eq!(role, Side::A);

    bob.handle_text(&format!(r#"{{"type":"join","roomId":"{code}"}}"#))
        .await;
    assert_eq!(joined_room(&mut rx_b).await, (code.clone(), Side::B));
    assert_eq!(
        next_event(&mut rx_a).await,
        ServerMsg::OpponentJoined { role: Side::B }
    );
    assert_eq!(bob.seat().map(|s| s.side), Some(Side::B));
}

#[tokio::test]
async fn joining_a_missing_room_reports_an_error() {
    let registry = RoomRegistry::new(RoomPolicy::default());
    let (mut conn, mut rx) = connect(&registry);

    conn.handle(ClientMsg::Join {
        room_id: "NOPE22".into(),
    })
    .await;

    assert_eq!(
        next_event(&mut rx).await,
        ServerMsg::Error {
            msg: "room not found".into()
        }
    );
    assert!(conn.seat().is_none());
}

#[tokio::test]
async fn bad_spawn_is_reported_to_the_sender() {
    let registry = RoomRegistry::new(RoomPolicy::default());
    let (mut conn, mut rx) = connect(&registry);
    conn.handle(ClientMsg::Create).await;
    joined_room(&mut rx).await;

    conn.handle_text(r#"{"type":"spawn","unitType":"dragon"}"#)
        .await;

    assert_eq!(
        next_event(&mut rx).await,
        ServerMsg::Error {
            msg: "unknown unit type: dragon".into()
        }
    );
}

#[tokio::test]
async fn spawned_units_show_up_in_snapshots() {
    let registry = RoomRegistry::new(RoomPolicy::default());
    let (mut conn, mut rx) = connect(&registry);
    conn.handle(ClientMsg::Create).await;
    joined_room(&mut rx).await;

    conn.handle(ClientMsg::Spawn {
        unit_type: "miner".into(),
    })
    .await;

    let seen = timeout(Duration::from_secs(2), async {
        loop {
            if let Some(ServerMsg::State { state, .. }) = rx.recv().await {
                if !state.units.is_empty() {
                    return state;
                }
            }
        }
    })
    .await
    .expect("miner never appeared");
    assert_eq!(seen.units[0].side, Side::A);
    assert_eq!(seen.pop.a, 1);
}

#[tokio::test]
async fn closing_a_connection_notifies_the_opponent() {
    let registry = RoomRegistry::new(RoomPolicy::default());
    let (mut alice, mut rx_a) = connect(&registry);
    let (mut bob, mut rx_b) = connect(&registry);

    alice.handle(ClientMsg::Create).await;
    let (code, _) = joined_room(&mut rx_a).await;
    bob.handle(ClientMsg::Join { room_id: code }).await;
    joined_room(&mut rx_b).await;
    next_event(&mut rx_a).await;

    bob.close().await;

    assert_eq!(
        next_event(&mut rx_a).await,
        ServerMsg::OpponentLeft { role: Side::B }
    );
}

#[tokio::test]
async fn creating_again_leaves_the_old_room() {
    let registry = RoomRegistry::new(RoomPolicy::default());
    let (mut alice, mut rx_a) = connect(&registry);
    let (mut bob, mut rx_b) = connect(&registry);

    alice.handle(ClientMsg::Create).await;
    let (first, _) = joined_room(&mut rx_a).await;
    bob.handle(ClientMsg::Join {
        room_id: first.clone(),
    })
    .await;
    joined_room(&mut rx_b).await;
    next_event(&mut rx_a).await;

    alice.handle(ClientMsg::Create).await;
    let (second, role) = joined_room(&mut rx_a).await;

    assert_ne!(first, second);
    assert_eq!(role, Side::A);
    assert_eq!(alice.seat().map(|s| s.room.id.clone()), Some(second));
    assert_eq!(
        next_event(&mut rx_b).await,
        ServerMsg::OpponentLeft { role: Side::A }
    );
    assert_eq!(registry.len(), 2);
}
