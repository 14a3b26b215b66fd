//! Extraction result model.

use serde::Serialize;

use crate::error::{ModelError, ModelResult};
use crate::media::DownloadEntry;
use crate::platform::Platform;

/// Uploader summary.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Author {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub followers: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tracks: Option<u64>,
}

/// Engagement counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Stats {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plays: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub likes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shares: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comments: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reposts: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replies: Option<u64>,
}

/// Platform-dependent descriptive attributes. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MediaMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    /// Formatted as `m:ss`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artwork: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub waveform_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<Author>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<Stats>,
}

/// Unified output of every extraction strategy.
///
/// Construction fails when `downloads` is empty, so a value of this type
/// always carries at least one entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractionResult {
    platform: Platform,
    #[serde(skip_serializing_if = "Option::is_none")]
    metadata: Option<MediaMetadata>,
    downloads: Vec<DownloadEntry>,
}

impl ExtractionResult {
    pub fn new(platform: Platform, downloads: Vec<DownloadEntry>) -> ModelResult<Self> {
        if downloads.is_empty() {
            return Err(ModelError::EmptyDownloads);
        }
        Ok(Self {
            platform,
            metadata: None,
            downloads,
        })
    }

    pub fn with_metadata(mut self, metadata: MediaMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn metadata(&self) -> Option<&MediaMetadata> {
        self.metadata.as_ref()
    }

    pub fn downloads(&self) -> &[DownloadEntry] {
        &self.downloads
    }
}
