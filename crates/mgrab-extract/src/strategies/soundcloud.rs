//! SoundCloud track resolution and progressive stream access.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::DateTime;
use mgrab_models::{Author, DownloadEntry, ExtractionResult, MediaKind, MediaMetadata, Platform, Stats};
use reqwest::{Client, Response};
use serde::Deserialize;
use tracing::{debug, info};

use crate::config::ExtractorConfig;
use crate::error::{ExtractError, ExtractResult};
use crate::http::{build_client, host_within};
use crate::traits::Extractor;

// =============================================================================
// API schema
// =============================================================================

/// A resolved SoundCloud track.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Track {
    pub id: u64,
    pub kind: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    /// Milliseconds
    pub duration: Option<u64>,
    pub genre: Option<String>,
    pub created_at: Option<String>,
    pub artwork_url: Option<String>,
    pub waveform_url: Option<String>,
    pub playback_count: Option<u64>,
    pub likes_count: Option<u64>,
    pub reposts_count: Option<u64>,
    pub comment_count: Option<u64>,
    pub user: Option<TrackUser>,
    pub media: Option<TrackMedia>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TrackUser {
    pub username: Option<String>,
    pub permalink: Option<String>,
    pub avatar_url: Option<String>,
    pub followers_count: Option<u64>,
    pub track_count: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TrackMedia {
    pub transcodings: Vec<Transcoding>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Transcoding {
    pub url: String,
    pub format: TranscodingFormat,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TranscodingFormat {
    pub protocol: String,
    pub mime_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StreamLocation {
    url: String,
}

impl Track {
    /// The progressive (single MP3 file) transcoding, if offered.
    pub fn progressive(&self) -> Option<&Transcoding> {
        self.media
            .as_ref()?
            .transcodings
            .iter()
            .find(|t| t.format.protocol == "progressive" && !t.url.is_empty())
    }
}

// =============================================================================
// Client
// =============================================================================

/// Authenticated access to the SoundCloud API.
///
/// Shared by the extractor and the asset proxy, which re-resolves the track
/// to obtain a fresh signed stream URL.
#[derive(Debug, Clone)]
pub struct SoundCloudClient {
    http: Client,
    api_url: String,
    client_id: String,
    stream_timeout: Duration,
}

impl SoundCloudClient {
    pub fn from_config(config: &ExtractorConfig) -> ExtractResult<Self> {
        Ok(Self {
            http: build_client(config.request_timeout)?,
            api_url: config.soundcloud_api_url.trim_end_matches('/').to_string(),
            client_id: config.soundcloud_client_id.clone(),
            stream_timeout: Duration::from_secs(600),
        })
    }

    /// Override the timeout applied to the final audio transfer.
    pub fn with_stream_timeout(mut self, timeout: Duration) -> Self {
        self.stream_timeout = timeout;
        self
    }

    /// Resolve a track page URL through `/resolve`.
    pub async fn resolve_track(&self, url: &str) -> ExtractResult<Track> {
        let response = self
            .http
            .get(format!("{}/resolve", self.api_url))
            .query(&[("url", url), ("client_id", self.client_id.as_str())])
            .send()
            .await
            .map_err(|e| ExtractError::failed(Platform::Soundcloud, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ExtractError::upstream(
                status.as_u16(),
                format!("SoundCloud resolve returned HTTP {}", status.as_u16()),
            ));
        }

        let track: Track = response
            .json()
            .await
            .map_err(|e| ExtractError::failed(Platform::Soundcloud, e))?;

        match track.kind.as_deref() {
            Some("track") | None => Ok(track),
            Some(other) => Err(ExtractError::failed(
                Platform::Soundcloud,
                format!("URL points at a {}, not a track", other),
            )),
        }
    }

    /// Open the progressive MP3 stream of a track page.
    ///
    /// Returns the origin response with its body unread.
    pub async fn open_stream(&self, url: &str) -> ExtractResult<Response> {
        let track = self.resolve_track(url).await?;
        let transcoding = track.progressive().ok_or_else(|| {
            ExtractError::failed(Platform::Soundcloud, "no progressive stream available")
        })?;

        let location_response = self
            .http
            .get(&transcoding.url)
            .query(&[("client_id", self.client_id.as_str())])
            .send()
            .await
            .map_err(|e| ExtractError::failed(Platform::Soundcloud, e))?;
        let status = location_response.status();
        if !status.is_success() {
            return Err(ExtractError::upstream(
                status.as_u16(),
                format!("SoundCloud stream lookup returned HTTP {}", status.as_u16()),
            ));
        }
        let location: StreamLocation = location_response
            .json()
            .await
            .map_err(|e| ExtractError::failed(Platform::Soundcloud, e))?;

        debug!(track_id = track.id, "Opening SoundCloud progressive stream");
        let stream = self
            .http
            .get(&location.url)
            .timeout(self.stream_timeout)
            .send()
            .await
            .map_err(|e| ExtractError::failed(Platform::Soundcloud, e))?;

        let status = stream.status();
        if !status.is_success() {
            return Err(ExtractError::upstream(
                status.as_u16(),
                format!("SoundCloud stream returned HTTP {}", status.as_u16()),
            ));
        }
        Ok(stream)
    }
}

// =============================================================================
// Extractor
// =============================================================================

pub struct SoundCloudExtractor {
    client: Arc<SoundCloudClient>,
}

impl SoundCloudExtractor {
    pub fn new(client: Arc<SoundCloudClient>) -> Self {
        Self { client }
    }
}

fn is_soundcloud_host(url: &str) -> bool {
    host_within(url, &["soundcloud.com"])
}

/// Milliseconds to `m:ss`, rounded to the nearest second.
pub fn format_duration(ms: u64) -> String {
    let total = (ms + 500) / 1000;
    format!("{}:{:02}", total / 60, total % 60)
}

fn format_date(raw: &str) -> String {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|_| raw.to_string())
}

fn track_filename(title: &str, id: u64) -> String {
    let slug: String = title
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
        .collect();
    format!("{}_{}.mp3", slug, id)
}

fn build_result(url: &str, track: Track) -> ExtractResult<ExtractionResult> {
    let title = track.title.clone().unwrap_or_default();
    let user = track.user.clone().unwrap_or_default();

    let artwork = track
        .artwork_url
        .as_deref()
        .filter(|a| !a.is_empty())
        .map(|a| a.replace("-large", "-t500x500"))
        .or_else(|| user.avatar_url.clone());

    let metadata = MediaMetadata {
        title: Some(title.clone()),
        description: Some(track.description.unwrap_or_default()),
        duration: Some(format_duration(track.duration.unwrap_or(0))),
        genre: Some(track.genre.unwrap_or_default()),
        created_at: track.created_at.as_deref().map(format_date),
        artwork,
        waveform_url: track.waveform_url,
        stats: Some(Stats {
            plays: Some(track.playback_count.unwrap_or(0)),
            likes: Some(track.likes_count.unwrap_or(0)),
            reposts: Some(track.reposts_count.unwrap_or(0)),
            comments: Some(track.comment_count.unwrap_or(0)),
            ..Default::default()
        }),
        author: Some(Author {
            name: user.username,
            username: user.permalink,
            avatar: user.avatar_url,
            followers: user.followers_count,
            tracks: user.track_count,
        }),
        ..Default::default()
    };

    let entry = DownloadEntry::new(MediaKind::Audio, url, &track_filename(&title, track.id));
    Ok(ExtractionResult::new(Platform::Soundcloud, vec![entry])?.with_metadata(metadata))
}

#[async_trait]
impl Extractor for SoundCloudExtractor {
    fn platform(&self) -> Platform {
        Platform::Soundcloud
    }

    async fn extract(&self, url: &str) -> ExtractResult<ExtractionResult> {
        if !is_soundcloud_host(url) {
            return Err(ExtractError::failed(Platform::Soundcloud, "invalid SoundCloud URL"));
        }

        let track = self.client.resolve_track(url).await.map_err(|e| match e {
            ExtractError::Upstream { .. } => ExtractError::failed(Platform::Soundcloud, e),
            other => other,
        })?;
        info!(track_id = track.id, "SoundCloud track resolved");
        build_result(url, track)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0), "0:00");
        assert_eq!(format_duration(61_000), "1:01");
        assert_eq!(format_duration(59_600), "1:00");
        assert_eq!(format_duration(225_499), "3:45");
    }

    #[test]
    fn test_track_filename() {
        assert_eq!(track_filename("My Song (Remix)!", 42), "my_song__remix___42.mp3");
        assert_eq!(track_filename("Café", 1), "caf__1.mp3");
    }

    #[test]
    fn test_format_date() {
        assert_eq!(format_date("2021-03-04T10:20:30Z"), "2021-03-04");
        assert_eq!(format_date("yesterday"), "yesterday");
    }

    #[test]
    fn test_host_validation() {
        assert!(is_soundcloud_host("https://soundcloud.com/a/b"));
        assert!(is_soundcloud_host("https://m.soundcloud.com/a/b"));
        assert!(!is_soundcloud_host("https://notsoundcloud.com/a"));
        assert!(!is_soundcloud_host("https://example.com/soundcloud.com"));
    }

    #[test]
    fn test_build_result() {
        let track: Track = serde_json::from_str(
            r#"{"id":7,"kind":"track","title":"Night Drive","duration":185000,
                "created_at":"2020-05-06T00:00:00Z","artwork_url":"https://i1.sndcdn.com/a-large.jpg",
                "playback_count":10,"user":{"username":"DJ","permalink":"dj","avatar_url":"https://i1/av.jpg","followers_count":3,"track_count":2}}"#,
        )
        .unwrap();
        let url = "https://soundcloud.com/dj/night-drive";
        let result = build_result(url, track).unwrap();

        let entry = &result.downloads()[0];
        assert_eq!(entry.kind, MediaKind::Audio);
        assert_eq!(entry.url, url);
        assert_eq!(entry.filename, "night_drive_7.mp3");

        let meta = result.metadata().unwrap();
        assert_eq!(meta.duration.as_deref(), Some("3:05"));
        assert_eq!(meta.created_at.as_deref(), Some("2020-05-06"));
        assert_eq!(meta.artwork.as_deref(), Some("https://i1.sndcdn.com/a-t500x500.jpg"));
        let stats = meta.stats.as_ref().unwrap();
        assert_eq!(stats.plays, Some(10));
        assert_eq!(stats.likes, Some(0));
        assert_eq!(meta.author.as_ref().unwrap().followers, Some(3));
    }

    #[test]
    fn test_artwork_falls_back_to_avatar() {
        let track: Track =
            serde_json::from_str(r#"{"id":1,"title":"t","user":{"avatar_url":"https://av"}}"#).unwrap();
        let result = build_result("https://soundcloud.com/a/t", track).unwrap();
        assert_eq!(result.metadata().unwrap().artwork.as_deref(), Some("https://av"));
    }

    #[test]
    fn test_progressive_selection() {
        let track: Track = serde_json::from_str(
            r#"{"id":1,"media":{"transcodings":[
                {"url":"https://api/hls","format":{"protocol":"hls","mime_type":"audio/mpeg"}},
                {"url":"https://api/prog","format":{"protocol":"progressive","mime_type":"audio/mpeg"}}]}}"#,
        )
        .unwrap();
        assert_eq!(track.progressive().unwrap().url, "https://api/prog");
    }
}
