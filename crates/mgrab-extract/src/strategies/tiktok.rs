//! TikTok extraction through an ordered chain of third-party sources.

use std::time::Duration;

use async_trait::async_trait;
use mgrab_models::{
    Author, DownloadEntry, ExtractionResult, MediaKind, MediaMetadata, Platform, Stats,
};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, error, info, warn};

use crate::config::ExtractorConfig;
use crate::error::{ExtractError, ExtractResult};
use crate::http::{build_client, build_no_redirect_client, resolve_redirect};
use crate::metrics::record_fallback_attempt;
use crate::traits::Extractor;

/// One alternative in the TikTok fallback chain.
///
/// `Ok(None)` means the source answered but had nothing for this URL.
#[async_trait]
pub trait TikTokSource: Send + Sync {
    fn name(&self) -> &str;

    async fn fetch(&self, url: &str) -> ExtractResult<Option<ExtractionResult>>;
}

/// Tries each source in order and returns the first non-empty result.
pub struct TikTokExtractor {
    sources: Vec<Box<dyn TikTokSource>>,
}

impl TikTokExtractor {
    /// Build the default chain: tikwm, then the reserved sources.
    pub fn new(config: &ExtractorConfig) -> ExtractResult<Self> {
        let mut sources: Vec<Box<dyn TikTokSource>> =
            vec![Box::new(TikwmSource::new(config)?)];
        for name in ["ttdownloader", "tikdown", "ssstik", "musicaldown"] {
            sources.push(Box::new(ReservedSource::new(name)));
        }
        Ok(Self::with_sources(sources))
    }

    pub fn with_sources(sources: Vec<Box<dyn TikTokSource>>) -> Self {
        Self { sources }
    }

    pub fn source_names(&self) -> Vec<&str> {
        self.sources.iter().map(|s| s.name()).collect()
    }
}

#[async_trait]
impl Extractor for TikTokExtractor {
    fn platform(&self) -> Platform {
        Platform::Tiktok
    }

    async fn extract(&self, url: &str) -> ExtractResult<ExtractionResult> {
        let mut failures: Vec<String> = Vec::new();

        for source in &self.sources {
            match source.fetch(url).await {
                Ok(Some(result)) => {
                    record_fallback_attempt(source.name(), "success");
                    info!(source = source.name(), downloads = result.downloads().len(), "TikTok source succeeded");
                    return Ok(result);
                }
                Ok(None) => {
                    record_fallback_attempt(source.name(), "empty");
                    debug!(source = source.name(), "TikTok source returned no result");
                    failures.push(format!("{}: no result", source.name()));
                }
                Err(e) => {
                    record_fallback_attempt(source.name(), "error");
                    warn!(source = source.name(), error = %e, "TikTok source failed");
                    failures.push(format!("{}: {}", source.name(), e));
                }
            }
        }

        error!(url = %url, failures = ?failures, "All TikTok sources failed");
        Err(ExtractError::failed(Platform::Tiktok, "all strategies exhausted"))
    }
}

// =============================================================================
// tikwm
// =============================================================================

#[derive(Debug, Deserialize)]
struct TikwmResponse {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    data: Option<TikwmVideo>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TikwmVideo {
    title: Option<String>,
    cover: Option<String>,
    play: Option<String>,
    wmplay: Option<String>,
    hdplay: Option<String>,
    music: Option<String>,
    play_count: Option<u64>,
    digg_count: Option<u64>,
    share_count: Option<u64>,
    comment_count: Option<u64>,
    author: Option<TikwmAuthor>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TikwmAuthor {
    unique_id: Option<String>,
    nickname: Option<String>,
    avatar: Option<String>,
}

/// The tikwm.com aggregation API.
pub struct TikwmSource {
    api: Client,
    probe: Client,
    base_url: String,
}

impl TikwmSource {
    pub fn new(config: &ExtractorConfig) -> ExtractResult<Self> {
        Ok(Self {
            api: build_client(config.request_timeout)?,
            probe: build_no_redirect_client(Duration::from_secs(15))?,
            base_url: config.tikwm_base_url.trim_end_matches('/').to_string(),
        })
    }

    /// tikwm hands back site-relative paths for its proxied assets.
    fn absolute(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            format!("{}{}", self.base_url, path)
        }
    }

    async fn resolve_optional(&self, path: Option<&str>) -> Option<String> {
        let src = self.absolute(path?);
        Some(resolve_redirect(&self.probe, &src).await)
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

#[async_trait]
impl TikTokSource for TikwmSource {
    fn name(&self) -> &str {
        "tikwm"
    }

    async fn fetch(&self, url: &str) -> ExtractResult<Option<ExtractionResult>> {
        let body = json!({ "url": url, "count": 12, "cursor": 0, "web": 1, "hd": 1 });

        let response = self
            .api
            .post(format!("{}/api/", self.base_url))
            .json(&body)
            .send()
            .await
            .map_err(|e| ExtractError::ExtractionFailed(format!("TikWM error: {}", e)))?;

        if !response.status().is_success() {
            return Err(ExtractError::ExtractionFailed(format!(
                "TikWM error: HTTP {}",
                response.status().as_u16()
            )));
        }

        let parsed: TikwmResponse = response
            .json()
            .await
            .map_err(|e| ExtractError::ExtractionFailed(format!("TikWM error: {}", e)))?;

        if parsed.code != 0 {
            debug!(code = parsed.code, msg = ?parsed.msg, "TikWM returned no result");
            return Ok(None);
        }
        let Some(video) = parsed.data else {
            return Ok(None);
        };

        // An empty path would resolve to the tikwm homepage, not a media file.
        let Some(hd_path) = non_empty(&video.hdplay).or_else(|| non_empty(&video.play)) else {
            debug!("TikWM result has no playable video");
            return Ok(None);
        };
        let wm_path = non_empty(&video.wmplay);
        let music_path = non_empty(&video.music);

        let hd_src = self.absolute(hd_path);
        let (hd_url, wm_url, music_url) = tokio::join!(
            resolve_redirect(&self.probe, &hd_src),
            self.resolve_optional(wm_path),
            self.resolve_optional(music_path),
        );

        let author = video.author.unwrap_or_default();
        let user = author.unique_id.clone().unwrap_or_else(|| "unknown".to_string());

        let mut downloads = vec![DownloadEntry::new(
            MediaKind::VideoHd,
            hd_url,
            &format!("tiktok_{}_hd.mp4", user),
        )];
        if let Some(wm_url) = wm_url {
            downloads.push(DownloadEntry::new(
                MediaKind::VideoWatermark,
                wm_url,
                &format!("tiktok_{}_watermark.mp4", user),
            ));
        }
        if let Some(music_url) = music_url {
            downloads.push(DownloadEntry::new(
                MediaKind::Audio,
                music_url,
                &format!("tiktok_{}_audio.mp3", user),
            ));
        }

        let metadata = MediaMetadata {
            title: video.title,
            thumbnail: video.cover,
            author: Some(Author {
                name: author.nickname,
                username: author.unique_id,
                avatar: author.avatar,
                ..Default::default()
            }),
            stats: Some(Stats {
                plays: video.play_count,
                likes: video.digg_count,
                shares: video.share_count,
                comments: video.comment_count,
                ..Default::default()
            }),
            ..Default::default()
        };

        Ok(Some(
            ExtractionResult::new(Platform::Tiktok, downloads)?.with_metadata(metadata),
        ))
    }
}

// =============================================================================
// Reserved sources
// =============================================================================

/// A chain slot whose scraper has not been written yet.
pub struct ReservedSource {
    name: &'static str,
}

impl ReservedSource {
    pub fn new(name: &'static str) -> Self {
        Self { name }
    }
}

#[async_trait]
impl TikTokSource for ReservedSource {
    fn name(&self) -> &str {
        self.name
    }

    async fn fetch(&self, _url: &str) -> ExtractResult<Option<ExtractionResult>> {
        Err(ExtractError::ExtractionFailed(format!("{} is not implemented", self.name)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    struct RecordingSource {
        name: &'static str,
        outcome: Outcome,
        seen: Arc<Mutex<Vec<(String, String)>>>,
    }

    #[derive(Clone, Copy)]
    enum Outcome {
        Fail,
        Empty,
        Hit,
    }

    #[async_trait]
    impl TikTokSource for RecordingSource {
        fn name(&self) -> &str {
            self.name
        }

        async fn fetch(&self, url: &str) -> ExtractResult<Option<ExtractionResult>> {
            self.seen
                .lock()
                .unwrap()
                .push((self.name.to_string(), url.to_string()));
            match self.outcome {
                Outcome::Fail => Err(ExtractError::ExtractionFailed("boom".into())),
                Outcome::Empty => Ok(None),
                Outcome::Hit => {
                    let entry = DownloadEntry::new(MediaKind::VideoHd, "https://cdn/x.mp4", "x.mp4");
                    Ok(Some(ExtractionResult::new(Platform::Tiktok, vec![entry])?))
                }
            }
        }
    }

    fn chain(outcomes: &[(&'static str, Outcome)]) -> (TikTokExtractor, Arc<Mutex<Vec<(String, String)>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sources = outcomes
            .iter()
            .map(|(name, outcome)| {
                Box::new(RecordingSource {
                    name: *name,
                    outcome: *outcome,
                    seen: Arc::clone(&seen),
                }) as Box<dyn TikTokSource>
            })
            .collect();
        (TikTokExtractor::with_sources(sources), seen)
    }

    #[tokio::test]
    async fn test_falls_back_with_same_url() {
        let (extractor, seen) = chain(&[("first", Outcome::Fail), ("second", Outcome::Hit)]);
        let url = "https://www.tiktok.com/@user/video/1";

        let result = extractor.extract(url).await.unwrap();
        assert_eq!(result.downloads().len(), 1);

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0], ("first".to_string(), url.to_string()));
        assert_eq!(seen[1], ("second".to_string(), url.to_string()));
    }

    #[tokio::test]
    async fn test_empty_result_is_skipped() {
        let (extractor, seen) =
            chain(&[("a", Outcome::Empty), ("b", Outcome::Hit), ("c", Outcome::Fail)]);
        extractor.extract("https://tiktok.com/x").await.unwrap();
        assert_eq!(seen.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_all_sources_exhausted() {
        let (extractor, seen) = chain(&[("a", Outcome::Fail), ("b", Outcome::Empty)]);
        let err = extractor.extract("https://tiktok.com/x").await.unwrap_err();
        assert!(matches!(err, ExtractError::ExtractionFailed(_)));
        assert!(err.to_string().contains("all strategies exhausted"));
        assert!(!err.to_string().contains("boom"));
        assert_eq!(seen.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_default_chain_order() {
        let extractor = TikTokExtractor::new(&ExtractorConfig::default()).unwrap();
        assert_eq!(
            extractor.source_names(),
            vec!["tikwm", "ttdownloader", "tikdown", "ssstik", "musicaldown"]
        );
    }

    #[tokio::test]
    async fn test_reserved_source_fails() {
        let err = ReservedSource::new("ssstik").fetch("https://tiktok.com/x").await.unwrap_err();
        assert_eq!(err.to_string(), "ssstik is not implemented");
    }

    #[test]
    fn test_absolute_paths() {
        let source = TikwmSource::new(&ExtractorConfig::default()).unwrap();
        assert_eq!(source.absolute("/video/media/play/1.mp4"), "https://www.tikwm.com/video/media/play/1.mp4");
        assert_eq!(source.absolute("https://sf16.example/m.mp3"), "https://sf16.example/m.mp3");
    }
}
