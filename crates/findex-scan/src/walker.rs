//! Folder walker producing file descriptors.

use crate::ScanError;
use chrono::{DateTime, Utc};
use findex_core::{category_for_extension, is_supported_extension, FileDescriptor};
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Directories never descended into (VCS internals, system trees).
const SKIP_DIRS: &[&str] = &[
    "node_modules",
    ".git",
    ".svn",
    ".hg",
    "System Volume Information",
    "$RECYCLE.BIN",
    "Windows",
    "Program Files",
    "Program Files (x86)",
    "ProgramData",
    "AppData",
];

/// Recursive folder scanner with extension-based classification.
pub struct Scanner;

impl Scanner {
    pub fn new() -> Self {
        Self
    }

    /// Walk the given folders and return descriptors for every
    /// supported file, sorted by path.
    ///
    /// Individual unreadable entries and missing folders are logged
    /// and skipped. Fails only when none of the requested folders is a
    /// directory, i.e. no sequence can be obtained at all.
    pub fn scan_folders(&self, folders: &[PathBuf]) -> Result<Vec<FileDescriptor>, ScanError> {
        let usable: Vec<&PathBuf> = folders.iter().filter(|f| f.is_dir()).collect();

        for folder in folders {
            if !folder.is_dir() {
                warn!(folder = ?folder, "Skipping folder that is not a directory");
            }
        }

        if usable.is_empty() {
            let first = folders.first().cloned().unwrap_or_default();
            return Err(ScanError::NotADirectory(first));
        }

        let mut descriptors = Vec::new();

        for folder in usable {
            self.scan_folder(folder, &mut descriptors);
        }

        descriptors.sort_by(|a, b| a.path.cmp(&b.path));

        debug!(count = descriptors.len(), "Scan finished");

        Ok(descriptors)
    }

    fn scan_folder(&self, folder: &Path, out: &mut Vec<FileDescriptor>) {
        let walker = WalkBuilder::new(folder)
            .hidden(true) // Skip hidden files and directories
            .git_ignore(false)
            .git_global(false)
            .git_exclude(false)
            .ignore(false)
            .filter_entry(|entry| {
                let name = entry.file_name().to_string_lossy();
                !SKIP_DIRS.contains(&name.as_ref())
            })
            .build();

        for result in walker {
            let entry = match result {
                Ok(entry) => entry,
                Err(e) => {
                    // Individual unreadable paths never abort the walk
                    warn!(error = %e, "Skipping unreadable entry");
                    continue;
                }
            };

            if !entry.file_type().map(|ft| ft.is_file()).unwrap_or(false) {
                continue;
            }

            match describe(entry.path()) {
                Ok(Some(descriptor)) => out.push(descriptor),
                Ok(None) => {} // unsupported extension
                Err(e) => {
                    warn!(path = ?entry.path(), error = %e, "Skipping file, metadata unreadable");
                }
            }
        }
    }
}

impl Default for Scanner {
    fn default() -> Self {
        Self::new()
    }
}

/// Build a descriptor for one file, or None when its extension is not
/// in the supported table.
fn describe(path: &Path) -> std::io::Result<Option<FileDescriptor>> {
    let extension = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy().to_lowercase()))
        .unwrap_or_default();

    if !is_supported_extension(&extension) {
        return Ok(None);
    }

    let metadata = std::fs::metadata(path)?;
    let last_modified: DateTime<Utc> = metadata
        .modified()
        .map(DateTime::from)
        .unwrap_or_else(|_| Utc::now());

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    Ok(Some(FileDescriptor {
        path: path.to_path_buf(),
        name,
        extension: extension.clone(),
        size: metadata.len(),
        last_modified,
        category: category_for_extension(&extension),
    }))
}
