//! IPC protocol definitions for Findex daemon communication.
//!
//! Uses MessagePack for efficient serialization over Unix sockets.

use findex_engine::{CorpusStats, SearchHit};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Request from client (CLI) to daemon
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Request {
    /// Scan and index the given folders
    StartIndexing { folders: Vec<PathBuf> },

    /// Fuzzy-search the indexed corpus
    Search {
        query: String,
        /// Reserved for future narrowing options; currently ignored
        #[serde(default, skip_serializing_if = "Option::is_none")]
        filters: Option<serde_json::Value>,
    },

    /// Get corpus statistics
    Stats,

    /// Remove every indexed record
    ClearIndex,

    /// Cooperatively stop the in-flight indexing run
    CancelIndexing,

    /// Get daemon status
    Status,

    /// Graceful shutdown
    Shutdown,

    /// Ping for health check
    Ping,
}

/// Response from daemon to client.
///
/// A connection carries zero or more `Progress` frames followed by
/// exactly one terminal frame (`Ok`, `Ack` or `Error`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Response {
    /// Success with optional data
    Ok {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        data: Option<ResponseData>,
    },

    /// Acknowledgment for fire-and-forget requests
    Ack,

    /// Intermediate progress frame for a long-running request
    Progress {
        processed: usize,
        total: usize,
        current_file: PathBuf,
    },

    /// Error response
    Error { code: ErrorCode, message: String },
}

impl Response {
    /// Create a success response with no data
    pub fn ok() -> Self {
        Response::Ok { data: None }
    }

    /// Create a success response with data
    pub fn ok_with(data: ResponseData) -> Self {
        Response::Ok { data: Some(data) }
    }

    /// Create an acknowledgment response
    pub fn ack() -> Self {
        Response::Ack
    }

    /// Create an error response
    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        Response::Error {
            code,
            message: message.into(),
        }
    }

    /// Whether this frame ends the request
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Response::Progress { .. })
    }
}

/// Response data variants
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponseData {
    /// Terminal summary of an indexing run
    IndexOutcome {
        success: bool,
        files_processed: usize,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },

    /// Ranked search results
    Hits { hits: Vec<SearchHit> },

    /// Corpus statistics
    Stats { stats: CorpusStats },

    /// Daemon status
    Status {
        version: String,
        uptime_secs: u64,
        indexing: bool,
        total_files: u64,
    },

    /// Pong response
    Pong { timestamp: i64 },
}

/// Error codes for error responses
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Request format is invalid
    InvalidRequest,
    /// An indexing run is already in flight
    IndexingInProgress,
    /// Internal daemon error
    InternalError,
    /// Operation timed out
    Timeout,
    /// Daemon is shutting down
    ShuttingDown,
}
