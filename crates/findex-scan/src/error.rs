//! Scanner error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while scanning folders.
///
/// Per-entry read failures inside a walk are logged and skipped; these
/// errors cover failures that prevent a walk from starting at all.
#[derive(Debug, Error)]
pub enum ScanError {
    /// I/O error during directory operations
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A requested folder does not exist or is not a directory
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ScanError::NotADirectory(PathBuf::from("/nope"));
        assert!(err.to_string().contains("/nope"));
    }
}
