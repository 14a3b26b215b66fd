//! Supported platform identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ModelError;

/// A media platform the dispatcher knows how to extract from.
///
/// The declaration order is the classifier's registration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Tiktok,
    Capcut,
    Xiaohongshu,
    Threads,
    Soundcloud,
}

impl Platform {
    /// All platforms in registration order.
    pub const ALL: [Platform; 5] = [
        Platform::Tiktok,
        Platform::Capcut,
        Platform::Xiaohongshu,
        Platform::Threads,
        Platform::Soundcloud,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Tiktok => "tiktok",
            Platform::Capcut => "capcut",
            Platform::Xiaohongshu => "xiaohongshu",
            Platform::Threads => "threads",
            Platform::Soundcloud => "soundcloud",
        }
    }

    /// Human-readable platform name.
    pub fn display_name(&self) -> &'static str {
        match self {
            Platform::Tiktok => "TikTok",
            Platform::Capcut => "CapCut",
            Platform::Xiaohongshu => "Xiaohongshu",
            Platform::Threads => "Threads",
            Platform::Soundcloud => "SoundCloud",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Platform {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Platform::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ModelError::UnknownPlatform(s.to_string()))
    }
}
