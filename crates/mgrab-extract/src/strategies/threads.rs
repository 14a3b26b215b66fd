//! Threads extraction through a third-party media API.

use async_trait::async_trait;
use chrono::Utc;
use mgrab_models::{Author, DownloadEntry, ExtractionResult, MediaKind, MediaMetadata, Platform, Stats};
use reqwest::Client;
use serde::Deserialize;
use tracing::info;

use crate::config::ExtractorConfig;
use crate::error::{ExtractError, ExtractResult};
use crate::http::{build_client, host_within, random_user_agent};
use crate::traits::Extractor;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ThreadsMediaResponse {
    video_urls: Option<Vec<ThreadsVideo>>,
    image_urls: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ThreadsVideo {
    download_url: Option<String>,
}

pub struct ThreadsExtractor {
    http: Client,
    api_url: String,
    origin: String,
}

impl ThreadsExtractor {
    pub fn new(config: &ExtractorConfig) -> ExtractResult<Self> {
        Ok(Self {
            http: build_client(config.threads_timeout)?,
            api_url: config.threads_api_url.clone(),
            origin: config.threads_origin.trim_end_matches('/').to_string(),
        })
    }
}

fn is_threads_url(url: &str) -> bool {
    host_within(url, &["threads.net", "threads.com"])
}

fn placeholder_metadata() -> MediaMetadata {
    MediaMetadata {
        title: Some(String::new()),
        caption: Some(String::new()),
        created_at: Some(Utc::now().to_rfc3339()),
        author: Some(Author {
            name: Some("Threads User".to_string()),
            username: Some("threads_user".to_string()),
            avatar: Some("https://via.placeholder.com/150".to_string()),
            ..Default::default()
        }),
        stats: Some(Stats {
            likes: Some(0),
            replies: Some(0),
            ..Default::default()
        }),
        ..Default::default()
    }
}

fn build_downloads(data: ThreadsMediaResponse, stamp: i64) -> Vec<DownloadEntry> {
    let videos = data
        .video_urls
        .unwrap_or_default()
        .into_iter()
        .filter_map(|v| v.download_url)
        .filter(|u| !u.is_empty())
        .enumerate()
        .map(|(i, url)| {
            DownloadEntry::new(MediaKind::Video, url, &format!("threads_video_{}_{}.mp4", stamp, i + 1))
        });

    let images = data
        .image_urls
        .unwrap_or_default()
        .into_iter()
        .filter(|u| !u.is_empty())
        .enumerate()
        .map(|(i, url)| {
            DownloadEntry::new(MediaKind::Image, url, &format!("threads_image_{}_{}.jpg", stamp, i + 1))
        });

    videos.chain(images).collect()
}

#[async_trait]
impl Extractor for ThreadsExtractor {
    fn platform(&self) -> Platform {
        Platform::Threads
    }

    async fn extract(&self, url: &str) -> ExtractResult<ExtractionResult> {
        if !is_threads_url(url) {
            return Err(ExtractError::failed(Platform::Threads, "invalid Threads URL"));
        }

        let response = self
            .http
            .get(&self.api_url)
            .query(&[("url", url)])
            .header("User-Agent", random_user_agent())
            .header("Accept", "*/*")
            .header("Origin", self.origin.as_str())
            .header("Referer", format!("{}/", self.origin))
            .send()
            .await
            .map_err(|e| ExtractError::failed(Platform::Threads, e))?;

        if !response.status().is_success() {
            return Err(ExtractError::failed(
                Platform::Threads,
                format!("media API returned HTTP {}", response.status().as_u16()),
            ));
        }

        let data: Option<ThreadsMediaResponse> = response
            .json()
            .await
            .map_err(|e| ExtractError::failed(Platform::Threads, e))?;
        let data = data.ok_or_else(|| ExtractError::failed(Platform::Threads, "no data from media API"))?;

        let downloads = build_downloads(data, Utc::now().timestamp_millis());
        if downloads.is_empty() {
            return Err(ExtractError::failed(Platform::Threads, "no media found"));
        }

        info!(downloads = downloads.len(), "Threads post extracted");
        Ok(ExtractionResult::new(Platform::Threads, downloads)?.with_metadata(placeholder_metadata()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_check() {
        assert!(is_threads_url("https://www.threads.net/@a/post/1"));
        assert!(is_threads_url("https://THREADS.COM/@a/post/1"));
        assert!(!is_threads_url("https://example.com/"));
        assert!(!is_threads_url("https://x.io/?u=threads.net"));
        assert!(!is_threads_url("https://evil.io/threads.com/post"));
    }

    #[test]
    fn test_build_downloads_numbers_per_kind() {
        let data: ThreadsMediaResponse = serde_json::from_str(
            r#"{"video_urls":[{"download_url":"https://v/1.mp4"},{"download_url":null}],"image_urls":["https://i/1.jpg","https://i/2.jpg"]}"#,
        )
        .unwrap();
        let entries = build_downloads(data, 1700000000000);

        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].kind, MediaKind::Video);
        assert_eq!(entries[0].filename, "threads_video_1700000000000_1.mp4");
        assert_eq!(entries[1].filename, "threads_image_1700000000000_1.jpg");
        assert_eq!(entries[2].filename, "threads_image_1700000000000_2.jpg");
    }

    #[test]
    fn test_placeholder_metadata() {
        let meta = placeholder_metadata();
        assert_eq!(meta.title.as_deref(), Some(""));
        assert_eq!(meta.author.unwrap().name.as_deref(), Some("Threads User"));
        assert_eq!(meta.stats.unwrap().likes, Some(0));
    }

    #[tokio::test]
    async fn test_rejects_non_threads_url() {
        let extractor = ThreadsExtractor::new(&ExtractorConfig::default()).unwrap();
        let err = extractor.extract("https://example.com/x").await.unwrap_err();
        assert!(matches!(err, ExtractError::ExtractionFailed(_)));
    }
}
