//! WebSocket transport: upgrade handler and per-connection pump.
//!
//! The endpoint (`/ws` by default) carries plain text both ways. Inbound
//! frames are handed to the bridge; whatever the bridge queues for the
//! connection is written back.

pub mod connection;
pub mod handler;
