//! Shared data models for the mediagrab backend.
//!
//! This crate provides Serde-serializable types for:
//! - Supported platforms
//! - Extraction results and download entries
//! - Filename sanitization shared by extractors and the proxy

pub mod error;
pub mod media;
pub mod platform;
pub mod result;
pub mod utils;

// Re-export common types
pub use error::{ModelError, ModelResult};
pub use media::{DownloadEntry, MediaKind};
pub use platform::Platform;
pub use result::{Author, ExtractionResult, MediaMetadata, Stats};
pub use utils::sanitize_filename;
