//! Prometheus metrics for the API server.

use std::sync::LazyLock;
use std::time::Instant;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::middleware::Next;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use regex::Regex;

/// Initialize the Prometheus metrics recorder.
/// Returns a handle that can be used to render metrics.
pub fn init_metrics() -> PrometheusHandle {
    PrometheusBuilder::new()
        .install_recorder()
        .expect("Failed to install Prometheus recorder")
}

/// Metric names as constants for consistency.
pub mod names {
    // HTTP metrics
    pub const HTTP_REQUESTS_TOTAL: &str = "mgrab_http_requests_total";
    pub const HTTP_REQUEST_DURATION_SECONDS: &str = "mgrab_http_request_duration_seconds";
    pub const HTTP_REQUESTS_IN_FLIGHT: &str = "mgrab_http_requests_in_flight";

    // Proxy metrics
    pub const PROXIED_BYTES_TOTAL: &str = "mgrab_proxied_bytes_total";
    pub const PROXY_REJECTIONS_TOTAL: &str = "mgrab_proxy_rejections_total";

    // Transient storage metrics
    pub const SWEPT_FILES_TOTAL: &str = "mgrab_swept_files_total";
}

/// Record an HTTP request.
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    let labels = [
        ("method", method.to_string()),
        ("path", sanitize_path(path)),
        ("status", status.to_string()),
    ];

    counter!(names::HTTP_REQUESTS_TOTAL, &labels).increment(1);
    histogram!(names::HTTP_REQUEST_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record bytes relayed for one asset.
pub fn record_proxied_bytes(platform: &str, mode: &str, bytes: u64) {
    let labels = [("platform", platform.to_string()), ("mode", mode.to_string())];
    counter!(names::PROXIED_BYTES_TOTAL, &labels).increment(bytes);
}

/// Record a buffered-mode size rejection.
pub fn record_proxy_rejection(platform: &str) {
    let labels = [("platform", platform.to_string())];
    counter!(names::PROXY_REJECTIONS_TOTAL, &labels).increment(1);
}

/// Record files removed by a sweep.
pub fn record_swept_files(count: usize) {
    counter!(names::SWEPT_FILES_TOTAL).increment(count as u64);
}

static ASSET_PATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^/api/download/[^/]+/[^/]+$").expect("valid regex"));

/// Collapse high-cardinality paths for metric labels.
fn sanitize_path(path: &str) -> String {
    if ASSET_PATH.is_match(path) {
        return "/api/download/:platform/:filename".to_string();
    }
    match path {
        "/api/download" | "/api/health" | "/health" | "/metrics" => path.to_string(),
        p if p.starts_with("/api/") => "/api/*".to_string(),
        _ => "/*".to_string(),
    }
}

/// Metrics middleware for HTTP requests.
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response<Body> {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).increment(1.0);

    let response = next.run(request).await;

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).decrement(1.0);

    let status = response.status().as_u16();
    let duration = start.elapsed().as_secs_f64();

    record_http_request(&method, &path, status, duration);

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_path() {
        assert_eq!(
            sanitize_path("/api/download/tiktok/tiktok_user_hd.mp4"),
            "/api/download/:platform/:filename"
        );
        assert_eq!(sanitize_path("/api/download"), "/api/download");
        assert_eq!(sanitize_path("/api/unknown/x"), "/api/*");
        assert_eq!(sanitize_path("/index.html"), "/*");
    }
}
