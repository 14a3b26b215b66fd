//! Extraction strategy trait.

use async_trait::async_trait;
use mgrab_models::{ExtractionResult, Platform};

use crate::error::ExtractResult;

/// One extraction strategy per platform.
///
/// Implementations turn a normalized page URL into direct, fetchable asset
/// URLs. A returned result always carries at least one download.
#[async_trait]
pub trait Extractor: Send + Sync {
    /// Platform this strategy serves.
    fn platform(&self) -> Platform;

    /// Extract downloads from `url`.
    async fn extract(&self, url: &str) -> ExtractResult<ExtractionResult>;
}
