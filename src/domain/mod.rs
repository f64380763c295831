//! Domain layer: connection identity, admission, command normalization and
//! response re-buffering.
//!
//! Everything here is synchronous and lock-free. It runs on the bridge task
//! only; see [`crate::bridge`].

pub mod client_link;
pub mod command;
pub mod connection_id;
pub mod connection_registry;
pub mod response_accumulator;

pub use client_link::{ClientHandle, ClientLink, Outbound};
pub use command::{NormalizedCommand, normalize};
pub use connection_id::{ConnectionId, IdAllocator};
pub use connection_registry::ConnectionRegistry;
pub use response_accumulator::ResponseAccumulator;
