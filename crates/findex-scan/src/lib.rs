//! Folder scanning and content extraction.
//!
//! These are the engine's external collaborators: the scanner turns
//! folders into [`findex_core::FileDescriptor`] sequences, and the
//! extractor turns descriptors into plain text, degrading to the
//! file's display name whenever a format cannot be read.

mod error;
mod extract;
mod walker;

pub use error::ScanError;
pub use extract::ContentExtractor;
pub use walker::Scanner;
