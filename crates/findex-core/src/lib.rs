//! Findex Core Components
//!
//! This crate provides the types shared across the Findex workspace:
//! file categories, descriptors produced by the scanner, and daemon
//! configuration.

mod category;
mod config;
mod descriptor;

pub use category::{category_for_extension, is_supported_extension, FileCategory};
pub use config::{DaemonConfig, SearchTuning};
pub use descriptor::FileDescriptor;
