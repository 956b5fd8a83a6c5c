//! Indexed records and search result types.

use chrono::{DateTime, Utc};
use findex_core::{FileCategory, FileDescriptor};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One indexed file: descriptor metadata plus extracted text.
///
/// Owned exclusively by the record store; at most one record exists per
/// path. `indexed_at` is refreshed on every insert or replace.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IndexedRecord {
    /// Absolute path; unique identity key
    pub path: PathBuf,
    /// Display name
    pub name: String,
    /// Lowercase extension with leading dot
    pub extension: String,
    /// Size in bytes
    pub size: u64,
    /// Last modification time of the file on disk
    pub last_modified: DateTime<Utc>,
    /// Category from the extension table
    pub category: FileCategory,
    /// Extracted plain text; empty string is valid (degraded extraction)
    pub content: String,
    /// When this record was (re)ingested
    pub indexed_at: DateTime<Utc>,
    /// Store-assigned insertion sequence; preserved across replacements
    /// so tie ordering stays stable
    #[serde(default)]
    pub seq: u64,
}

impl IndexedRecord {
    /// Build a record from a descriptor and its extracted content.
    ///
    /// `indexed_at` is set to now; `seq` is assigned by the store.
    pub fn from_descriptor(descriptor: &FileDescriptor, content: String) -> Self {
        Self {
            path: descriptor.path.clone(),
            name: descriptor.name.clone(),
            extension: descriptor.extension.clone(),
            size: descriptor.size,
            last_modified: descriptor.last_modified,
            category: descriptor.category,
            content,
            indexed_at: Utc::now(),
            seq: 0,
        }
    }
}

/// Where a query matched within one field of a record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MatchSpan {
    /// Field name ("name" or "content")
    pub field: String,
    /// The full field value the ranges index into
    pub matched_text: String,
    /// Inclusive character-index ranges of the approximate match
    pub ranges: Vec<(usize, usize)>,
}

/// One ranked search result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    /// The matched record
    pub record: IndexedRecord,
    /// Combined score in [0, 1]; 0 is a perfect match
    pub score: f64,
    /// Per-field match locations, only for fields that matched
    pub matches: Vec<MatchSpan>,
}
