//! Input URL normalization.

use crate::error::{ExtractError, ExtractResult};

/// Message returned for blank input.
pub const EMPTY_URL_MESSAGE: &str = "URL cannot be empty";

/// Trim the input and force an `https://` scheme when none is present.
///
/// The scheme check is case-insensitive, so `HTTP://x` is left untouched.
/// Normalizing an already normalized URL returns it unchanged.
pub fn normalize_url(raw: &str) -> ExtractResult<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ExtractError::invalid_input(EMPTY_URL_MESSAGE));
    }

    if has_http_scheme(trimmed) {
        Ok(trimmed.to_string())
    } else {
        Ok(format!("https://{}", trimmed))
    }
}

fn has_http_scheme(url: &str) -> bool {
    let lower = url.get(..8).unwrap_or(url).to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}
