//! Transient file storage.
//!
//! This crate provides:
//! - Collision-resistant transient files under a dedicated root
//! - Drop-guard cleanup tied to the owning request
//! - Age-based sweeping of leftovers

pub mod error;
pub mod transient;

pub use error::{StorageError, StorageResult};
pub use transient::{TransientFile, TransientStore};
