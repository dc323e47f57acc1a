//! Error types for the bridge
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using BridgeError
pub type Result<T> = std::result::Result<T, BridgeError>;

/// Unified error type for bridge operations
#[derive(Debug, Error)]
pub enum BridgeError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Codec Errors
    // -------------------------------------------------------------------------
    #[error("Decode error: expected {expected} bytes, got {actual}")]
    Decode { expected: usize, actual: usize },

    #[error("Malformed payload: {0}")]
    Malformed(String),

    #[error("Encode error: {0}")]
    Encode(String),

    #[error("Opcode space exhausted: index {index} does not fit a {width}-byte code")]
    OpcodeOverflow { index: usize, width: usize },

    // -------------------------------------------------------------------------
    // Transport Errors
    // -------------------------------------------------------------------------
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Interrupted")]
    Interrupted,

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl BridgeError {
    /// Whether this error means the link itself is gone and must be reopened
    pub fn is_transport(&self) -> bool {
        matches!(self, BridgeError::Transport(_) | BridgeError::Io(_))
    }

    /// Whether this error is a payload fault confined to a single message
    pub fn is_decode(&self) -> bool {
        matches!(self, BridgeError::Decode { .. } | BridgeError::Malformed(_))
    }
}

impl From<serialport::Error> for BridgeError {
    fn from(e: serialport::Error) -> Self {
        BridgeError::Transport(e.to_string())
    }
}
