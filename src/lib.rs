//! cursorshare — real-time cursor presence relay.
//!
//! A WebSocket server that relays each participant's cursor position and
//! presence status to every other participant, plus the static browser
//! client that renders remote cursors. All state is in-memory; the
//! registry starts empty on every boot.

pub mod config;
pub mod frame;
pub mod routes;
pub mod services;
pub mod state;
