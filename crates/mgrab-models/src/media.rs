//! Download entry models.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::utils::sanitize_filename;

/// Kind of asset a download entry points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Video,
    VideoHd,
    VideoWatermark,
    Audio,
    Image,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Video => "video",
            MediaKind::VideoHd => "video_hd",
            MediaKind::VideoWatermark => "video_watermark",
            MediaKind::Audio => "audio",
            MediaKind::Image => "image",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One fetchable asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DownloadEntry {
    #[serde(rename = "type")]
    pub kind: MediaKind,

    /// Direct asset URL (never an HTML page)
    pub url: String,

    /// Suggested, filesystem-safe filename
    pub filename: String,

    /// Headers the origin requires to serve `url`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<BTreeMap<String, String>>,
}

impl DownloadEntry {
    /// Create an entry; the filename is sanitized on the way in.
    pub fn new(kind: MediaKind, url: impl Into<String>, filename: &str) -> Self {
        Self {
            kind,
            url: url.into(),
            filename: sanitize_filename(filename),
            headers: None,
        }
    }

    /// Attach origin headers.
    pub fn with_headers(mut self, headers: BTreeMap<String, String>) -> Self {
        self.headers = Some(headers);
        self
    }
}
