//! Error types for the AniDB UDP client
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using AnidbError
pub type Result<T> = std::result::Result<T, AnidbError>;

/// Unified error type for client operations
#[derive(Debug, Error)]
pub enum AnidbError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Network Errors
    // -------------------------------------------------------------------------
    #[error("Network error: {0}")]
    Network(String),

    #[error("Not connected")]
    NotConnected,

    // -------------------------------------------------------------------------
    // Protocol Errors
    // -------------------------------------------------------------------------
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Reply for unknown tag: {0}")]
    UnknownCorrelation(String),

    #[error("Protocol anomaly: {0}")]
    ProtocolAnomaly(String),

    #[error("{0} requires an active session")]
    SessionRequired(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("API key is already configured")]
    ApiKeyAlreadySet,

    #[error("Unknown parameter: {0}")]
    UnknownParameter(String),

    #[error("Parameter '{name}' expects {expected}, got '{value}'")]
    InvalidParameter {
        name: String,
        expected: &'static str,
        value: String,
    },
}
