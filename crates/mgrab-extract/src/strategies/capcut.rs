//! CapCut placeholder strategy.

use async_trait::async_trait;
use mgrab_models::{ExtractionResult, Platform};

use crate::error::{ExtractError, ExtractResult};
use crate::traits::Extractor;

/// Registered so CapCut URLs classify, but extraction always fails.
#[derive(Debug, Default)]
pub struct CapCutExtractor;

#[async_trait]
impl Extractor for CapCutExtractor {
    fn platform(&self) -> Platform {
        Platform::Capcut
    }

    async fn extract(&self, _url: &str) -> ExtractResult<ExtractionResult> {
        Err(ExtractError::ExtractionFailed(
            "CapCut extraction is not implemented yet".to_string(),
        ))
    }
}
