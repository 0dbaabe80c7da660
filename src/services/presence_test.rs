use super::*;
use crate::state::test_helpers;
use tokio::sync::mpsc;
use tokio::time::{Duration, timeout};

async fn assert_channel_has_frame(rx: &mut mpsc::Receiver<Frame>) -> Frame {
    timeout(Duration::from_millis(200), rx.recv())
        .await
        .expect("frame receive timed out")
        .expect("channel closed")
}

async fn assert_channel_empty(rx: &mut mpsc::Receiver<Frame>) {
    assert!(
        timeout(Duration::from_millis(80), rx.recv()).await.is_err(),
        "expected channel to remain empty"
    );
}

#[tokio::test]
async fn broadcast_sends_to_all_except_excluded_client() {
    let state = AppState::new();
    let (_client_a, mut rx_a) = test_helpers::connect_client(&state).await;
    let (client_b, mut rx_b) = test_helpers::connect_client(&state).await;
    let (_client_c, mut rx_c) = test_helpers::connect_client(&state).await;

    let frame = Frame::request("presence:snapshot", Data::new());
    broadcast(&state, &frame, Some(client_b)).await;

    let recv_a = assert_channel_has_frame(&mut rx_a).await;
    let recv_c = assert_channel_has_frame(&mut rx_c).await;
    assert_eq!(recv_a.syscall, "presence:snapshot");
    assert_eq!(recv_c.syscall, "presence:snapshot");
    assert_channel_empty(&mut rx_b).await;
}

#[tokio::test]
async fn broadcast_reaches_connections_that_never_joined() {
    let state = AppState::new();
    let (_joined, mut rx_joined) = test_helpers::join_client(&state, "Alice", "#ff0000").await;
    let (_lurker, mut rx_lurker) = test_helpers::connect_client(&state).await;

    broadcast_snapshot(&state).await;

    assert_channel_has_frame(&mut rx_joined).await;
    let frame = assert_channel_has_frame(&mut rx_lurker).await;
    assert_eq!(frame.syscall, "presence:snapshot");
}

#[tokio::test]
async fn join_overwrites_previous_entry() {
    let state = AppState::new();
    let (client_id, _rx) = test_helpers::connect_client(&state).await;

    join(&state, client_id, "Alice", "#ff0000").await;
    join(&state, client_id, "Alicia", "#0000ff").await;

    let snap = snapshot(&state).await;
    assert_eq!(snap.len(), 1);
    let p = snap.get(&client_id).expect("participant present");
    assert_eq!(p.name, "Alicia");
    assert_eq!(p.color, "#0000ff");
    assert_eq!(p.status, ParticipantStatus::Active);
}

#[tokio::test]
async fn duplicate_names_and_colors_are_allowed() {
    let state = AppState::new();
    let (a, _rx_a) = test_helpers::join_client(&state, "Alice", "#ff0000").await;
    let (b, _rx_b) = test_helpers::join_client(&state, "Alice", "#ff0000").await;

    let snap = snapshot(&state).await;
    assert_eq!(snap.len(), 2);
    assert_eq!(snap.get(&a).map(|p| p.name.as_str()), Some("Alice"));
    assert_eq!(snap.get(&b).map(|p| p.name.as_str()), Some("Alice"));
}

#[tokio::test]
async fn update_status_is_noop_for_unknown_client() {
    let state = AppState::new();
    let changed = update_status(&state, Uuid::new_v4(), ParticipantStatus::Paused).await;
    assert!(!changed);
    assert!(snapshot(&state).await.is_empty());
}

#[tokio::test]
async fn update_status_overwrites_known_client() {
    let state = AppState::new();
    let (client_id, _rx) = test_helpers::join_client(&state, "Bob", "#00ff00").await;

    let changed = update_status(&state, client_id, ParticipantStatus::Paused).await;
    assert!(changed);
    let snap = snapshot(&state).await;
    assert_eq!(snap.get(&client_id).map(|p| p.status), Some(ParticipantStatus::Paused));
}

#[tokio::test]
async fn remove_deletes_exactly_once() {
    let state = AppState::new();
    let (client_id, _rx) = test_helpers::join_client(&state, "Alice", "#ff0000").await;

    remove(&state, client_id).await;
    assert!(snapshot(&state).await.is_empty());

    // Second remove is a no-op.
    remove(&state, client_id).await;
    assert!(snapshot(&state).await.is_empty());
}

#[tokio::test]
async fn registry_size_tracks_live_joins() {
    let state = AppState::new();
    assert_eq!(snapshot(&state).await.len(), 0);

    let (a, _rx_a) = test_helpers::join_client(&state, "Alice", "#ff0000").await;
    let (_b, _rx_b) = test_helpers::join_client(&state, "Bob", "#00ff00").await;
    assert_eq!(snapshot(&state).await.len(), 2);

    remove(&state, a).await;
    assert_eq!(snapshot(&state).await.len(), 1);
}

#[tokio::test]
async fn snapshot_data_serializes_participants_keyed_by_id() {
    let state = AppState::new();
    let (client_id, _rx) = test_helpers::join_client(&state, "Alice", "#ff0000").await;

    let data = snapshot_data(&snapshot(&state).await);
    let participants = data.get("participants").expect("participants key");
    let entry = participants
        .get(client_id.to_string())
        .expect("entry keyed by client id");
    assert_eq!(entry.get("name").and_then(|v| v.as_str()), Some("Alice"));
    assert_eq!(entry.get("status").and_then(|v| v.as_str()), Some("active"));
}

#[tokio::test]
async fn unregister_connection_stops_delivery() {
    let state = AppState::new();
    let (client_id, mut rx) = test_helpers::connect_client(&state).await;

    unregister_connection(&state, client_id).await;
    broadcast_snapshot(&state).await;

    // Sender side was dropped with the registration.
    assert!(rx.recv().await.is_none());
}
