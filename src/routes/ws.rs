//! WebSocket handler — bidirectional frame relay.
//!
//! DESIGN
//! ======
//! On upgrade, generates a client ID and enters a `select!` loop:
//! - Incoming client frames → parse + dispatch by syscall prefix
//! - Broadcast frames from peers → forward to client
//!
//! Handler functions are pure business logic — they validate, mutate the
//! registry, and return an `Outcome`. The dispatch layer owns all outbound
//! concerns: reply to sender and broadcast to peers.
//!
//! LIFECYCLE
//! =========
//! 1. Upgrade → register sender, send `session:connected` with `client_id`
//! 2. Client sends frames → dispatch → handler returns Outcome
//! 3. Dispatch applies Outcome (reply / broadcast / drop)
//! 4. Close → remove participant → broadcast snapshot + `presence:left`

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::frame::{Data, Frame};
use crate::services::{cursor, presence};
use crate::state::{AppState, Participant, ParticipantStatus};

// =============================================================================
// OUTCOME
// =============================================================================

/// Result returned by handler functions. The dispatch layer uses this to
/// decide who receives what — handlers never send frames directly.
enum Outcome {
    /// Registry changed: correlated done+snapshot to sender,
    /// `presence:snapshot` to every other open connection.
    Snapshot,
    /// Ephemeral cursor fan-out to all peers excluding sender. No reply.
    Cursor { x: f64, y: f64, participant: Participant },
    /// Silently drop the event: no reply, no broadcast.
    Ignore,
}

// =============================================================================
// UPGRADE
// =============================================================================

pub async fn handle_ws(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| run_ws(socket, state))
}

// =============================================================================
// CONNECTION
// =============================================================================

async fn run_ws(mut socket: WebSocket, state: AppState) {
    let client_id = Uuid::new_v4();

    // Per-connection channel for receiving broadcast frames from peers.
    let (client_tx, mut client_rx) = mpsc::channel::<Frame>(256);
    presence::register_connection(&state, client_id, client_tx).await;

    let welcome =
        Frame::request("session:connected", Data::new()).with_data("client_id", client_id.to_string());
    if send_frame(&mut socket, &welcome).await.is_err() {
        presence::unregister_connection(&state, client_id).await;
        return;
    }

    info!(%client_id, "ws: client connected");

    loop {
        tokio::select! {
            msg = socket.recv() => {
                let Some(msg) = msg else { break };
                let Ok(msg) = msg else { break };
                match msg {
                    Message::Text(text) => {
                        let sender_frames = process_inbound_text(&state, client_id, &text).await;
                        for frame in sender_frames {
                            let _ = send_frame(&mut socket, &frame).await;
                        }
                    }
                    Message::Close(_) => break,
                    _ => {}
                }
            }
            Some(frame) = client_rx.recv() => {
                if send_frame(&mut socket, &frame).await.is_err() {
                    break;
                }
            }
        }
    }

    // Cleanup order matters: drop the sender first so the departed
    // connection is excluded from its own departure broadcasts, then
    // remove the registry entry, then notify everyone left.
    presence::unregister_connection(&state, client_id).await;
    presence::remove(&state, client_id).await;
    presence::broadcast_snapshot(&state).await;

    let left =
        Frame::request("presence:left", Data::new()).with_data("client_id", client_id.to_string());
    presence::broadcast(&state, &left, None).await;

    info!(%client_id, "ws: client disconnected");
}

// =============================================================================
// FRAME DISPATCH
// =============================================================================

/// Parse and process one inbound text frame and return frames for the
/// sender. Broadcasts to peers happen inside; malformed input is dropped
/// without a reply.
///
/// Split out from the socket loop so tests can exercise dispatch and
/// broadcast behavior without a live WebSocket.
pub(crate) async fn process_inbound_text(state: &AppState, client_id: Uuid, text: &str) -> Vec<Frame> {
    let req: Frame = match serde_json::from_str(text) {
        Ok(r) => r,
        Err(e) => {
            warn!(%client_id, error = %e, "ws: invalid inbound frame, dropped");
            return vec![];
        }
    };

    let prefix = req.prefix();
    let is_cursor = prefix == "cursor";
    if !is_cursor {
        info!(%client_id, id = %req.id, syscall = %req.syscall, status = ?req.status, "ws: recv frame");
    }

    let result = match prefix {
        "presence" => handle_presence(state, client_id, &req).await,
        "cursor" => handle_cursor(state, client_id, &req).await,
        _ => Err(req.error(format!("unknown prefix: {prefix}"))),
    };

    // Apply outcome — the dispatch layer owns all outbound logic.
    match result {
        Ok(Outcome::Snapshot) => {
            let participants = presence::snapshot(state).await;
            let data = presence::snapshot_data(&participants);

            let peer_frame = Frame::request("presence:snapshot", data.clone());
            presence::broadcast(state, &peer_frame, Some(client_id)).await;

            vec![req.done_with(data)]
        }
        Ok(Outcome::Cursor { x, y, participant }) => {
            cursor::broadcast_cursor(state, client_id, x, y, &participant).await;
            vec![]
        }
        Ok(Outcome::Ignore) => vec![],
        Err(err_frame) => vec![err_frame],
    }
}

// =============================================================================
// PRESENCE HANDLERS
// =============================================================================

async fn handle_presence(state: &AppState, client_id: Uuid, req: &Frame) -> Result<Outcome, Frame> {
    let op = req.syscall.split_once(':').map_or("", |(_, op)| op);

    match op {
        "join" => {
            // Accepted as-is: empty names, duplicate names, arbitrary
            // color strings. Rejoining overwrites the previous entry.
            let name = req.data.get("name").and_then(|v| v.as_str()).unwrap_or("");
            let color = req.data.get("color").and_then(|v| v.as_str()).unwrap_or("");

            presence::join(state, client_id, name, color).await;
            Ok(Outcome::Snapshot)
        }
        "status" => {
            let status = req
                .data
                .get("status")
                .and_then(|v| serde_json::from_value::<ParticipantStatus>(v.clone()).ok());
            let Some(status) = status else {
                debug!(%client_id, "ws: unparseable status, dropped");
                return Ok(Outcome::Ignore);
            };

            if presence::update_status(state, client_id, status).await {
                Ok(Outcome::Snapshot)
            } else {
                // Status change before join: drop silently.
                Ok(Outcome::Ignore)
            }
        }
        _ => Err(req.error(format!("unknown presence op: {op}"))),
    }
}

// =============================================================================
// CURSOR HANDLER
// =============================================================================

async fn handle_cursor(state: &AppState, client_id: Uuid, req: &Frame) -> Result<Outcome, Frame> {
    let op = req.syscall.split_once(':').map_or("", |(_, op)| op);

    match op {
        "move" => {
            // Cursor moves before joining are dropped silently.
            let Some(participant) = presence::participant(state, client_id).await else {
                return Ok(Outcome::Ignore);
            };

            let x = req.data.get("x").and_then(serde_json::Value::as_f64).unwrap_or(0.0);
            let y = req.data.get("y").and_then(serde_json::Value::as_f64).unwrap_or(0.0);

            Ok(Outcome::Cursor { x, y, participant })
        }
        _ => Err(req.error(format!("unknown cursor op: {op}"))),
    }
}

// =============================================================================
// HELPERS
// =============================================================================

async fn send_frame(socket: &mut WebSocket, frame: &Frame) -> Result<(), ()> {
    let json = match serde_json::to_string(frame) {
        Ok(j) => j,
        Err(e) => {
            warn!(error = %e, "ws: failed to serialize frame");
            return Err(());
        }
    };
    // Cursor traffic is too chatty to log.
    if !frame.syscall.starts_with("cursor:") {
        info!(id = %frame.id, syscall = %frame.syscall, status = ?frame.status, "ws: send frame");
    }
    socket.send(Message::Text(json.into())).await.map_err(|_| ())
}

#[cfg(test)]
#[path = "ws_test.rs"]
mod tests;
