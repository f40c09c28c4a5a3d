//! Error types for aeromock
//!
//! Connection-level failures only. Per-request outcomes travel as
//! [`ResultCode`](crate::protocol::ResultCode) inside a response.

use thiserror::Error;

/// Result type alias using AeroError
pub type Result<T> = std::result::Result<T, AeroError>;

/// Unified error type for aeromock operations
#[derive(Debug, Error)]
pub enum AeroError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Protocol Errors
    // -------------------------------------------------------------------------
    /// Malformed or truncated input. The byte stream can no longer be trusted,
    /// so the connection is closed.
    #[error("Protocol error: {0}")]
    Protocol(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl AeroError {
    pub(crate) fn protocol(message: impl Into<String>) -> Self {
        AeroError::Protocol(message.into())
    }
}
