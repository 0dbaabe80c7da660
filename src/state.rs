//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor.
//! It holds a single room: the presence registry (joined participants) and
//! the connection registry (per-connection senders for outgoing frames).
//! The two maps are independent on purpose — a connection receives
//! broadcasts from the moment the socket opens, but appears in snapshots
//! only after it completes the join handshake.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::{RwLock, mpsc};
use uuid::Uuid;

use crate::frame::Frame;

// =============================================================================
// PARTICIPANT
// =============================================================================

/// Sharing status, flipped by the client's pause button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParticipantStatus {
    Active,
    Paused,
}

/// A joined participant. Name and color are client-supplied and unvalidated;
/// duplicates across participants are allowed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Participant {
    pub name: String,
    pub color: String,
    pub status: ParticipantStatus,
}

impl Participant {
    #[must_use]
    pub fn new(name: impl Into<String>, color: impl Into<String>) -> Self {
        Self { name: name.into(), color: color.into(), status: ParticipantStatus::Active }
    }
}

// =============================================================================
// ROOM STATE
// =============================================================================

/// Live state for the single shared room. Purely in-memory: empty at
/// process start and after every restart.
pub struct RoomState {
    /// Joined participants keyed by connection ID.
    pub participants: HashMap<Uuid, Participant>,
    /// Open connections: `client_id` -> sender for outgoing frames.
    pub clients: HashMap<Uuid, mpsc::Sender<Frame>>,
}

impl RoomState {
    #[must_use]
    pub fn new() -> Self {
        Self { participants: HashMap::new(), clients: HashMap::new() }
    }
}

impl Default for RoomState {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// APP STATE
// =============================================================================

/// Shared application state, injected into Axum handlers via State extractor.
/// Clone is required by Axum — the inner room is Arc-wrapped.
#[derive(Clone)]
pub struct AppState {
    pub room: Arc<RwLock<RoomState>>,
}

impl AppState {
    #[must_use]
    pub fn new() -> Self {
        Self { room: Arc::new(RwLock::new(RoomState::new())) }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================

#[cfg(test)]
pub mod test_helpers {
    use super::*;

    /// Register an open connection and return its id plus the receiving end.
    pub async fn connect_client(state: &AppState) -> (Uuid, mpsc::Receiver<Frame>) {
        let client_id = Uuid::new_v4();
        let (tx, rx) = mpsc::channel(8);
        state.room.write().await.clients.insert(client_id, tx);
        (client_id, rx)
    }

    /// Register a connection that has also completed the join handshake.
    pub async fn join_client(
        state: &AppState,
        name: &str,
        color: &str,
    ) -> (Uuid, mpsc::Receiver<Frame>) {
        let (client_id, rx) = connect_client(state).await;
        state
            .room
            .write()
            .await
            .participants
            .insert(client_id, Participant::new(name, color));
        (client_id, rx)
    }
}
