//! Presence service — registry operations and frame fan-out.
//!
//! DESIGN
//! ======
//! All registry operations are total: join overwrites, status-update and
//! remove are no-ops for unknown ids, and nothing returns an error. The
//! relay's only observable output is broadcasts, so every mutation here is
//! paired with a snapshot broadcast at the call site.
//!
//! Broadcast is best-effort `try_send` into per-connection bounded
//! channels. A slow client whose channel is full misses the frame; the
//! next snapshot catches it up.

use std::collections::HashMap;

use tokio::sync::mpsc;
use tracing::info;
use uuid::Uuid;

use crate::frame::{Data, Frame};
use crate::state::{AppState, Participant, ParticipantStatus};

// =============================================================================
// CONNECTION REGISTRY
// =============================================================================

/// Register an open connection's outgoing sender. Called on upgrade,
/// before any join handshake.
pub async fn register_connection(state: &AppState, client_id: Uuid, tx: mpsc::Sender<Frame>) {
    let mut room = state.room.write().await;
    room.clients.insert(client_id, tx);
    info!(%client_id, connections = room.clients.len(), "connection registered");
}

/// Drop a connection's sender. Called once, when the socket closes.
pub async fn unregister_connection(state: &AppState, client_id: Uuid) {
    let mut room = state.room.write().await;
    room.clients.remove(&client_id);
    info!(%client_id, connections = room.clients.len(), "connection unregistered");
}

// =============================================================================
// REGISTRY OPERATIONS
// =============================================================================

/// Insert or overwrite a participant with status active. Name and color are
/// accepted as-is.
pub async fn join(state: &AppState, client_id: Uuid, name: &str, color: &str) {
    let mut room = state.room.write().await;
    room.participants.insert(client_id, Participant::new(name, color));
    info!(%client_id, name, participants = room.participants.len(), "participant joined");
}

/// Overwrite a participant's status. Returns false (and changes nothing)
/// if the connection never joined.
pub async fn update_status(state: &AppState, client_id: Uuid, status: ParticipantStatus) -> bool {
    let mut room = state.room.write().await;
    let Some(participant) = room.participants.get_mut(&client_id) else {
        return false;
    };
    participant.status = status;
    true
}

/// Delete a participant. No-op for connections that never joined.
pub async fn remove(state: &AppState, client_id: Uuid) {
    let mut room = state.room.write().await;
    if room.participants.remove(&client_id).is_some() {
        info!(%client_id, participants = room.participants.len(), "participant removed");
    }
}

/// Look up one participant by connection id.
pub async fn participant(state: &AppState, client_id: Uuid) -> Option<Participant> {
    state.room.read().await.participants.get(&client_id).cloned()
}

/// Full registry read, used for snapshot broadcasts.
pub async fn snapshot(state: &AppState) -> HashMap<Uuid, Participant> {
    state.room.read().await.participants.clone()
}

/// Wrap a registry snapshot as `presence:snapshot` frame data.
#[must_use]
pub fn snapshot_data(participants: &HashMap<Uuid, Participant>) -> Data {
    let mut data = Data::new();
    data.insert("participants".into(), serde_json::to_value(participants).unwrap_or_default());
    data
}

// =============================================================================
// BROADCAST
// =============================================================================

/// Broadcast a frame to every open connection, optionally excluding one.
pub async fn broadcast(state: &AppState, frame: &Frame, exclude: Option<Uuid>) {
    let room = state.room.read().await;
    for (client_id, tx) in &room.clients {
        if exclude == Some(*client_id) {
            continue;
        }
        // Best-effort: if a client's channel is full, skip it.
        let _ = tx.try_send(frame.clone());
    }
}

/// Broadcast the current snapshot to every open connection.
pub async fn broadcast_snapshot(state: &AppState) {
    let participants = snapshot(state).await;
    let frame = Frame::request("presence:snapshot", snapshot_data(&participants));
    broadcast(state, &frame, None).await;
}

#[cfg(test)]
#[path = "presence_test.rs"]
mod tests;
