//! Model error types.

use thiserror::Error;

/// Result type for model construction.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors raised when a model invariant would be violated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("extraction produced no downloadable media")]
    EmptyDownloads,

    #[error("unknown platform: {0}")]
    UnknownPlatform(String),
}
