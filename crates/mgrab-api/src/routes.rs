//! API routes.

use std::any::Any;

use axum::handler::HandlerWithoutStateExt;
use axum::middleware;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::services::ServeDir;
use tracing::error;

use crate::error::ApiError;
use crate::handlers::{health, not_found, proxy_asset, resolve_media};
use crate::metrics::metrics_middleware;
use crate::middleware::{cors_layer, request_id, request_logging, security_headers};
use crate::state::AppState;

/// Create the API router.
pub fn create_router(state: AppState, metrics_handle: Option<PrometheusHandle>) -> Router {
    let api_routes = Router::new()
        .route("/download", post(resolve_media))
        .route("/download/:platform/:filename", get(proxy_asset))
        .route("/health", get(health));

    let health_routes = Router::new().route("/health", get(health));

    // Metrics endpoint (if enabled)
    let metrics_routes = if let Some(handle) = metrics_handle {
        Router::new().route("/metrics", get(move || async move { handle.render() }))
    } else {
        Router::new()
    };

    let router = Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .merge(metrics_routes);

    // Static front-end, with unmatched paths still answering the JSON 404
    let router = match &state.config.static_dir {
        Some(dir) => router.fallback_service(
            ServeDir::new(dir).not_found_service(not_found.into_service()),
        ),
        None => router.fallback(not_found),
    };

    router
        .layer(RequestBodyLimitLayer::new(state.config.max_body_size))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(security_headers))
        .layer(middleware::from_fn(request_logging))
        .layer(middleware::from_fn(request_id))
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(cors_layer(&state.config.cors_origins))
        .with_state(state)
}

/// Render a handler panic as the generic JSON 500.
pub fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    error!(panic = %detail, "Handler panicked");
    ApiError::internal(detail).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_panic_becomes_500() {
        let response = handle_panic(Box::new("boom"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
