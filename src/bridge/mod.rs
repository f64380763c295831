//! Bridge layer: the controller that multiplexes clients onto the
//! interpreter, its wire notices, and the task that drives it.

pub mod actor;
pub mod controller;
pub mod messages;

pub use actor::{BridgeEvent, BridgeHandle, spawn_bridge};
pub use controller::{Admission, Bridge, BridgeLimits};
pub use messages::BridgeStatus;
