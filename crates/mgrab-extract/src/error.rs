//! Extraction error types.

use mgrab_models::{ModelError, Platform};
use thiserror::Error;

/// Result type for classification and extraction.
pub type ExtractResult<T> = Result<T, ExtractError>;

/// Message shown when no platform pattern matches.
pub const UNSUPPORTED_PLATFORM_MESSAGE: &str = "Platform tidak didukung";

/// Errors that can occur while resolving a URL into downloads.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("{}", UNSUPPORTED_PLATFORM_MESSAGE)]
    UnsupportedPlatform,

    #[error("{0}")]
    ExtractionFailed(String),

    /// The origin answered with an error status.
    #[error("{message}")]
    Upstream { status: u16, message: String },
}

impl ExtractError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Build an `ExtractionFailed` prefixed with the platform name.
    pub fn failed(platform: Platform, reason: impl std::fmt::Display) -> Self {
        Self::ExtractionFailed(format!(
            "Failed to extract from {}: {}",
            platform.display_name(),
            reason
        ))
    }

    /// Build an `Upstream` error from an origin status.
    pub fn upstream(status: u16, message: impl Into<String>) -> Self {
        Self::Upstream {
            status,
            message: message.into(),
        }
    }

    /// Origin status code, when the failure came from one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Upstream { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<ModelError> for ExtractError {
    fn from(e: ModelError) -> Self {
        match e {
            ModelError::EmptyDownloads => Self::ExtractionFailed(e.to_string()),
            ModelError::UnknownPlatform(_) => Self::UnsupportedPlatform,
        }
    }
}
