//! URL → platform classification.
//!
//! Platforms are tested in registration order against the URL host. A host
//! matches when it equals a registered domain or is any subdomain of it
//! (`www.`, `m.`, `vm.`, `vt.`, ...). The registered domains are disjoint, so
//! the first match is the only match.

use mgrab_models::Platform;
use regex::Regex;
use url::Url;

use crate::error::{ExtractError, ExtractResult};

/// Domains owned by each platform, in registration order.
const DEFAULT_RULES: &[(Platform, &[&str])] = &[
    (
        Platform::Tiktok,
        &["tiktok.com", "douyin.com", "snaptik.app", "musicaldown.com", "tiktokcdn.com"],
    ),
    (Platform::Capcut, &["capcut.com", "capcutpro.com"]),
    (Platform::Xiaohongshu, &["xiaohongshu.com", "xhslink.com", "xhs.cn"]),
    (Platform::Threads, &["threads.net", "threads.com"]),
    (Platform::Soundcloud, &["soundcloud.com", "snd.sc"]),
];

/// Ordered host-pattern classifier.
#[derive(Debug, Clone)]
pub struct PlatformClassifier {
    rules: Vec<(Platform, Regex)>,
}

impl PlatformClassifier {
    /// Create an empty classifier.
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    /// Append a platform and the domains it owns.
    pub fn register(mut self, platform: Platform, domains: &[&str]) -> Result<Self, regex::Error> {
        self.rules.push((platform, host_pattern(domains)?));
        Ok(self)
    }

    /// Platforms in registration order.
    pub fn platforms(&self) -> impl Iterator<Item = Platform> + '_ {
        self.rules.iter().map(|(platform, _)| *platform)
    }

    /// Classify a normalized URL.
    pub fn classify(&self, url: &str) -> ExtractResult<Platform> {
        let parsed = Url::parse(url).map_err(|_| ExtractError::UnsupportedPlatform)?;
        let host = parsed
            .host_str()
            .map(|h| h.trim_end_matches('.'))
            .ok_or(ExtractError::UnsupportedPlatform)?;

        self.rules
            .iter()
            .find(|(_, pattern)| pattern.is_match(host))
            .map(|(platform, _)| *platform)
            .ok_or(ExtractError::UnsupportedPlatform)
    }
}

impl Default for PlatformClassifier {
    fn default() -> Self {
        DEFAULT_RULES
            .iter()
            .try_fold(Self::empty(), |classifier, (platform, domains)| {
                classifier.register(*platform, domains)
            })
            .expect("built-in platform patterns are valid")
    }
}

/// Build `^(sub.)*(domain-a|domain-b)$`, case-insensitive.
fn host_pattern(domains: &[&str]) -> Result<Regex, regex::Error> {
    let alternatives = domains
        .iter()
        .map(|d| regex::escape(d))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"(?i)^(?:[a-z0-9-]+\.)*(?:{})$", alternatives))
}
