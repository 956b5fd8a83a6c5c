//! IPC error types.

use thiserror::Error;

/// Errors that can occur during IPC operations
#[derive(Debug, Error)]
pub enum IpcError {
    /// IO error during socket operations
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Request size exceeded maximum
    #[error("Request too large (max 1MB)")]
    RequestTooLarge,

    /// Failed to deserialize message
    #[error("Deserialization failed: {0}")]
    Deserialize(#[from] rmp_serde::decode::Error),

    /// Failed to serialize message
    #[error("Serialization failed: {0}")]
    Serialize(#[from] rmp_serde::encode::Error),

    /// Request timed out
    #[error("Request timed out")]
    Timeout(#[from] tokio::time::error::Elapsed),

    /// Connection failed
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Daemon not running
    #[error("Daemon not running (socket not found)")]
    DaemonNotRunning,
}
