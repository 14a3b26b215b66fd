//! Resolve pipeline: normalize, classify, dispatch to the platform strategy.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use mgrab_models::{ExtractionResult, Platform};
use tracing::{info, warn};

use crate::classifier::PlatformClassifier;
use crate::config::ExtractorConfig;
use crate::error::{ExtractError, ExtractResult};
use crate::metrics::record_extraction;
use crate::normalize::normalize_url;
use crate::strategies::{
    CapCutExtractor, SoundCloudClient, SoundCloudExtractor, ThreadsExtractor, TikTokExtractor,
    XiaohongshuExtractor,
};
use crate::traits::Extractor;

/// Registered table of extraction strategies keyed by platform.
#[derive(Clone)]
pub struct MediaResolver {
    classifier: PlatformClassifier,
    extractors: HashMap<Platform, Arc<dyn Extractor>>,
}

impl MediaResolver {
    /// Resolver with a classifier and no strategies.
    pub fn new(classifier: PlatformClassifier) -> Self {
        Self {
            classifier,
            extractors: HashMap::new(),
        }
    }

    /// Resolver with every built-in strategy registered.
    pub fn with_defaults(
        config: &ExtractorConfig,
        soundcloud: Arc<SoundCloudClient>,
    ) -> ExtractResult<Self> {
        Ok(Self::new(PlatformClassifier::default())
            .register(Arc::new(TikTokExtractor::new(config)?))
            .register(Arc::new(CapCutExtractor))
            .register(Arc::new(XiaohongshuExtractor::new(config)?))
            .register(Arc::new(ThreadsExtractor::new(config)?))
            .register(Arc::new(SoundCloudExtractor::new(soundcloud))))
    }

    /// Register (or replace) the strategy for its platform.
    pub fn register(mut self, extractor: Arc<dyn Extractor>) -> Self {
        self.extractors.insert(extractor.platform(), extractor);
        self
    }

    pub fn classifier(&self) -> &PlatformClassifier {
        &self.classifier
    }

    /// Turn raw user input into an extraction result.
    pub async fn resolve(&self, raw: &str) -> ExtractResult<ExtractionResult> {
        let url = normalize_url(raw)?;
        let platform = self.classifier.classify(&url)?;
        let extractor = self
            .extractors
            .get(&platform)
            .ok_or(ExtractError::UnsupportedPlatform)?;

        let start = Instant::now();
        let result = extractor.extract(&url).await;
        let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
        record_extraction(platform.as_str(), result.is_ok(), elapsed_ms);

        match &result {
            Ok(r) => info!(
                platform = %platform,
                downloads = r.downloads().len(),
                elapsed_ms = elapsed_ms as u64,
                "Extraction succeeded"
            ),
            Err(e) => warn!(platform = %platform, error = %e, "Extraction failed"),
        }
        result
    }
}
