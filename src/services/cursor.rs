//! Cursor service — ephemeral cursor position broadcast.
//!
//! DESIGN
//! ======
//! Cursor positions are purely ephemeral: broadcast to peers and
//! immediately forgotten. No state storage. The outbound frame is
//! enriched with the sender's registered name and color so receivers
//! never need their own participant lookup.

use uuid::Uuid;

use crate::frame::{Data, Frame};
use crate::services::presence;
use crate::state::{AppState, Participant};

/// Broadcast a cursor position to all open connections except the sender.
pub async fn broadcast_cursor(
    state: &AppState,
    from_client_id: Uuid,
    x: f64,
    y: f64,
    from: &Participant,
) {
    let mut data = Data::new();
    data.insert("client_id".into(), serde_json::json!(from_client_id));
    data.insert("x".into(), serde_json::json!(x));
    data.insert("y".into(), serde_json::json!(y));
    data.insert("color".into(), serde_json::json!(from.color));
    data.insert("name".into(), serde_json::json!(from.name));

    let frame = Frame::request("cursor:moved", data);

    presence::broadcast(state, &frame, Some(from_client_id)).await;
}

#[cfg(test)]
#[path = "cursor_test.rs"]
mod tests;
