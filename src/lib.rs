//! # station-gateway
//!
//! WebSocket gateway that lets several browser throttles share one
//! command station interpreter.
//!
//! The interpreter is single-threaded and speaks a bracketed text protocol
//! (`<s>`, `<t 3 50 1>`, ...). This crate admits up to a fixed number of
//! WebSocket clients, turns each inbound frame into one bracketed command,
//! runs it through the interpreter and streams the reply back to the
//! client that sent it, one message per output line. Server-side notices
//! can be broadcast to every client.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP, WebSocket)
//!     │
//!     ├── HTTP Handlers + static UI (api/)
//!     ├── WS pump per connection (ws/)
//!     │
//!     ├── BridgeHandle ──events──▶ bridge task (bridge/)
//!     │                              │
//!     │        ConnectionRegistry ◀──┤
//!     │        normalize ◀───────────┤
//!     │        ResponseAccumulator ◀─┤ (domain/)
//!     │                              │
//!     └──────────────────────────────┴── CommandInterpreter (interpreter)
//! ```

pub mod api;
pub mod app_state;
pub mod bridge;
pub mod config;
pub mod domain;
pub mod error;
pub mod interpreter;
pub mod ws;
