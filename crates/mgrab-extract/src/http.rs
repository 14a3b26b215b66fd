//! Shared outbound HTTP helpers.

use std::time::Duration;

use rand::seq::IndexedRandom;
use reqwest::{redirect, Client, StatusCode};
use tracing::debug;
use url::Url;

use crate::error::{ExtractError, ExtractResult};

/// Desktop browser user agent presented to origins that reject bots.
pub const DESKTOP_UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

const USER_AGENTS: &[&str] = &[
    DESKTOP_UA,
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:109.0) Gecko/20100101 Firefox/121.0",
];

/// Pick one of the rotating browser user agents.
pub fn random_user_agent() -> &'static str {
    USER_AGENTS
        .choose(&mut rand::rng())
        .copied()
        .unwrap_or(DESKTOP_UA)
}

/// Build a client that follows redirects.
pub fn build_client(timeout: Duration) -> ExtractResult<Client> {
    Client::builder()
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(10))
        .pool_idle_timeout(Duration::from_secs(90))
        .build()
        .map_err(|e| ExtractError::ExtractionFailed(format!("HTTP client setup failed: {}", e)))
}

/// Build a client that never follows redirects, for reading `Location`.
pub fn build_no_redirect_client(timeout: Duration) -> ExtractResult<Client> {
    Client::builder()
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(10))
        .redirect(redirect::Policy::none())
        .build()
        .map_err(|e| ExtractError::ExtractionFailed(format!("HTTP client setup failed: {}", e)))
}

/// Follow a single redirect hop with a HEAD request.
///
/// Returns the `Location` target (joined to `url` when relative) for a 3xx
/// answer, and `url` unchanged for anything else, including errors.
/// `client` must not follow redirects itself.
pub async fn resolve_redirect(client: &Client, url: &str) -> String {
    let response = match client.head(url).header("User-Agent", DESKTOP_UA).send().await {
        Ok(r) => r,
        Err(e) => {
            debug!(url = %url, error = %e, "Redirect probe failed, keeping original URL");
            return url.to_string();
        }
    };

    if !is_redirect(response.status()) {
        return url.to_string();
    }

    let Some(location) = response
        .headers()
        .get(reqwest::header::LOCATION)
        .and_then(|v| v.to_str().ok())
    else {
        return url.to_string();
    };

    match Url::parse(url).and_then(|base| base.join(location)) {
        Ok(resolved) => resolved.to_string(),
        Err(_) => url.to_string(),
    }
}

/// True when the URL host is one of `domains` or a subdomain of one.
pub fn host_within(url: &str, domains: &[&str]) -> bool {
    let Some(host) = Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.trim_end_matches('.').to_ascii_lowercase()))
    else {
        return false;
    };
    domains.iter().any(|d| {
        host == *d
            || host
                .strip_suffix(d)
                .is_some_and(|prefix| prefix.ends_with('.'))
    })
}

fn is_redirect(status: StatusCode) -> bool {
    status.is_redirection() && status != StatusCode::NOT_MODIFIED
}
