//! # anidb-udp
//!
//! Client engine for the AniDB UDP API:
//! - Tag-correlated requests and replies over an unreliable transport
//! - Strict minimum interval between sends
//! - Session, login and encryption state tracking
//! - NAT keep-alive pings during idle periods
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                          Callers                             │
//! │             submit() ──► ResponseWaiter::wait()              │
//! └───────┬──────────────────────────────────────▲──────────────┘
//!         │ Request (tagged)                     │ CommandResult
//! ┌───────▼─────────┐                    ┌───────┴──────────────┐
//! │  Outbound Queue │                    │  Reply slots (by tag)│
//! └───────┬─────────┘                    └───────▲──────────────┘
//!         │                                      │
//! ┌───────▼─────────┐   awaiting-reply   ┌───────┴──────────────┐
//! │   Writer Loop   │ ─────── map ─────► │  Reader / Dispatcher │
//! │ (rate limited)  │                    │  (parse, correlate)  │
//! └───────┬─────────┘                    └───────▲──────────────┘
//!         │               UDP socket             │
//!         └──────────────► server ───────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod session;
pub mod protocol;
pub mod network;
pub mod engine;
pub mod client;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{AnidbError, Result};
pub use config::Config;
pub use engine::Engine;
pub use client::Client;
pub use session::Session;
pub use network::{EngineEvent, ResponseWaiter};
pub use protocol::{CommandResult, RequestBuilder, ResultKind, ReturnCode};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of the crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
