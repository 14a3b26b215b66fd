//! Filename helpers shared by extractors and the asset proxy.

/// Maximum length of a sanitized filename.
const MAX_FILENAME_LEN: usize = 120;

/// Fallback used when nothing safe is left of the input.
const FALLBACK_FILENAME: &str = "download";

/// Make a filename safe to use as a single path component.
///
/// Path separators and `.`/`..` segments are dropped, whitespace becomes `_`,
/// and anything outside `[A-Za-z0-9._-]` is removed. Leading dots are stripped
/// so the result is never a hidden file.
pub fn sanitize_filename(name: &str) -> String {
    let joined: String = name
        .split(|c| c == '/' || c == '\\')
        .filter(|s| !s.is_empty() && *s != "." && *s != "..")
        .collect::<Vec<_>>()
        .join("");

    let sanitized: String = joined
        .chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_' || *c == '.')
        .take(MAX_FILENAME_LEN)
        .collect();

    let sanitized = sanitized.trim_start_matches('.');

    if sanitized.is_empty() {
        FALLBACK_FILENAME.to_string()
    } else {
        sanitized.to_string()
    }
}
