//! Extractor configuration.

use std::time::Duration;

/// Default SoundCloud public client id.
const DEFAULT_SOUNDCLOUD_CLIENT_ID: &str = "yLfooVZK5emWPvRLZQlSuGTO8pof6z4t";

/// Endpoints, credentials and timeouts used by the extraction strategies.
#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    /// TikWM aggregation API base URL
    pub tikwm_base_url: String,
    /// Threads third-party media API
    pub threads_api_url: String,
    /// Origin/Referer presented to the Threads API
    pub threads_origin: String,
    /// Timeout for the Threads API call
    pub threads_timeout: Duration,
    /// SoundCloud API base URL
    pub soundcloud_api_url: String,
    /// SoundCloud client credential
    pub soundcloud_client_id: String,
    /// Default timeout for every other outbound API call
    pub request_timeout: Duration,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            tikwm_base_url: "https://www.tikwm.com".to_string(),
            threads_api_url: "https://api.threadsphotodownloader.com/v2/media".to_string(),
            threads_origin: "https://sssthreads.pro".to_string(),
            threads_timeout: Duration::from_secs(30),
            soundcloud_api_url: "https://api-v2.soundcloud.com".to_string(),
            soundcloud_client_id: DEFAULT_SOUNDCLOUD_CLIENT_ID.to_string(),
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl ExtractorConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            tikwm_base_url: std::env::var("TIKWM_BASE_URL").unwrap_or(defaults.tikwm_base_url),
            threads_api_url: std::env::var("THREADS_API_URL").unwrap_or(defaults.threads_api_url),
            threads_origin: std::env::var("THREADS_ORIGIN").unwrap_or(defaults.threads_origin),
            threads_timeout: defaults.threads_timeout,
            soundcloud_api_url: std::env::var("SOUNDCLOUD_API_URL")
                .unwrap_or(defaults.soundcloud_api_url),
            soundcloud_client_id: std::env::var("SOUNDCLOUD_CLIENT_ID")
                .unwrap_or(defaults.soundcloud_client_id),
            request_timeout: Duration::from_secs(
                std::env::var("EXTRACT_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            ),
        }
    }
}
