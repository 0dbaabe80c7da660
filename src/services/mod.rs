//! Domain services used by the websocket route.
//!
//! ARCHITECTURE
//! ============
//! Service modules own the presence registry and fan-out logic so the route
//! handler can stay focused on protocol translation and connection
//! lifecycle.

pub mod cursor;
pub mod presence;
