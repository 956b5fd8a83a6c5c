//! File descriptors produced by the scanner.

use crate::FileCategory;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Metadata for a file discovered on disk, before content extraction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileDescriptor {
    /// Absolute path; the unique identity key of the eventual record
    pub path: PathBuf,
    /// Display name (final path component)
    pub name: String,
    /// Lowercase extension including the leading dot ("" when none)
    pub extension: String,
    /// Size in bytes
    pub size: u64,
    /// Last modification time
    pub last_modified: DateTime<Utc>,
    /// Category from the static extension table
    pub category: FileCategory,
}
