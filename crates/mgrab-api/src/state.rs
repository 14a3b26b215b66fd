//! Application state.

use std::sync::Arc;

use mgrab_extract::{ExtractorConfig, MediaResolver, SoundCloudClient};
use mgrab_storage::TransientStore;

use crate::config::ApiConfig;
use crate::services::AssetProxy;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub resolver: Arc<MediaResolver>,
    pub proxy: Arc<AssetProxy>,
    pub store: TransientStore,
}

impl AppState {
    /// Create new application state.
    pub fn new(config: ApiConfig, extractor: ExtractorConfig) -> anyhow::Result<Self> {
        let soundcloud = Arc::new(
            SoundCloudClient::from_config(&extractor)?.with_stream_timeout(config.asset_timeout),
        );
        let resolver = MediaResolver::with_defaults(&extractor, Arc::clone(&soundcloud))?;
        let proxy = AssetProxy::new(&config, soundcloud)?;
        let store = TransientStore::new(&config.temp_dir, config.temp_max_age);

        Ok(Self {
            config,
            resolver: Arc::new(resolver),
            proxy: Arc::new(proxy),
            store,
        })
    }
}
