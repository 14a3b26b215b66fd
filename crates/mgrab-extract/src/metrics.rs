//! Extraction metrics.
//!
//! - Extraction counters by platform and outcome
//! - Extraction latency histogram
//! - TikTok fallback attempt counters by source

use metrics::{counter, histogram};

// =============================================================================
// Metric Names
// =============================================================================

pub mod names {
    /// Total extractions by platform and outcome.
    pub const EXTRACTIONS_TOTAL: &str = "mgrab_extractions_total";

    /// Extraction latency in seconds by platform.
    pub const EXTRACTION_SECONDS: &str = "mgrab_extraction_seconds";

    /// Fallback chain attempts by source and outcome.
    pub const FALLBACK_ATTEMPTS_TOTAL: &str = "mgrab_fallback_attempts_total";
}

// =============================================================================
// Recording Functions
// =============================================================================

/// Record a finished extraction.
pub fn record_extraction(platform: &str, success: bool, latency_ms: f64) {
    let outcome = if success { "success" } else { "failure" };

    counter!(
        names::EXTRACTIONS_TOTAL,
        "platform" => platform.to_string(),
        "outcome" => outcome
    )
    .increment(1);

    histogram!(
        names::EXTRACTION_SECONDS,
        "platform" => platform.to_string()
    )
    .record(latency_ms / 1000.0);
}

/// Record one attempt of a fallback source.
pub fn record_fallback_attempt(source: &str, outcome: &'static str) {
    counter!(
        names::FALLBACK_ATTEMPTS_TOTAL,
        "source" => source.to_string(),
        "outcome" => outcome
    )
    .increment(1);
}
