//! Network Module
//!
//! UDP connection and the loops that drive it.
//!
//! ## Architecture
//! - Writer thread: rate-limited sends and keep-alives
//! - Reader thread: receive, correlate, publish
//! - One waiter per caller, blocking only that caller

mod connection;
mod events;
mod reader;
mod waiter;
mod writer;

pub use connection::Connection;
pub use events::{EngineEvent, EventBus};
pub use waiter::ResponseWaiter;
pub use writer::{dispatch_policy, DeclineReason};
