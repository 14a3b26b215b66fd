//! API error types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use mgrab_extract::error::UNSUPPORTED_PLATFORM_MESSAGE;
use mgrab_extract::ExtractError;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

pub type ApiResult<T> = Result<T, ApiError>;

/// Body returned for unhandled failures.
pub const SERVER_ERROR_MESSAGE: &str = "Server error occurred";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Extraction(String),

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Too many requests: {0}")]
    RateLimited(String),

    #[error("Failed to download file: {message}")]
    ProxyFailed { status: Option<u16>, message: String },

    #[error("file too large, max: {max_mb}MB")]
    PayloadTooLarge { max_mb: u64 },

    #[error("Not Found")]
    RouteNotFound,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn proxy_failed(status: Option<u16>, msg: impl Into<String>) -> Self {
        Self::ProxyFailed {
            status,
            message: msg.into(),
        }
    }

    /// Map an origin error status onto the matching proxy error.
    pub fn from_origin_status(status: u16, detail: impl Into<String>) -> Self {
        let detail = detail.into();
        match status {
            403 => Self::AccessDenied(detail),
            404 => Self::NotFound(detail),
            429 => Self::RateLimited(detail),
            s if s >= 400 => Self::proxy_failed(Some(s), detail),
            _ => Self::proxy_failed(None, detail),
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Extraction(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::AccessDenied(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) | ApiError::RouteNotFound => StatusCode::NOT_FOUND,
            ApiError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            ApiError::ProxyFailed { status, .. } => status
                .filter(|s| (400..600).contains(s))
                .and_then(|s| StatusCode::from_u16(s).ok())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            ApiError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ExtractError> for ApiError {
    fn from(e: ExtractError) -> Self {
        match e {
            ExtractError::InvalidInput(msg) => Self::BadRequest(msg),
            ExtractError::UnsupportedPlatform => {
                Self::Extraction(UNSUPPORTED_PLATFORM_MESSAGE.to_string())
            }
            ExtractError::ExtractionFailed(msg) => Self::Extraction(msg),
            ExtractError::Upstream { status, message } => Self::from_origin_status(status, message),
        }
    }
}

impl From<mgrab_storage::StorageError> for ApiError {
    fn from(e: mgrab_storage::StorageError) -> Self {
        Self::Internal(e.to_string())
    }
}

impl From<std::io::Error> for ApiError {
    fn from(e: std::io::Error) -> Self {
        Self::Internal(e.to_string())
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Internal details stay in the logs.
        let message = match &self {
            ApiError::Internal(detail) => {
                error!(error = %detail, "Unhandled internal error");
                SERVER_ERROR_MESSAGE.to_string()
            }
            _ => self.to_string(),
        };

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_status_mapping() {
        assert_eq!(ApiError::from_origin_status(403, "x").status_code(), StatusCode::FORBIDDEN);
        assert_eq!(ApiError::from_origin_status(404, "x").status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::from_origin_status(429, "x").status_code(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(ApiError::from_origin_status(502, "x").status_code(), StatusCode::BAD_GATEWAY);
        assert_eq!(
            ApiError::from_origin_status(302, "x").status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_messages() {
        assert_eq!(ApiError::from_origin_status(403, "HTTP 403").to_string(), "Access denied: HTTP 403");
        assert_eq!(
            ApiError::PayloadTooLarge { max_mb: 45 }.to_string(),
            "file too large, max: 45MB"
        );
    }

    #[test]
    fn test_extract_error_mapping() {
        let err: ApiError = ExtractError::invalid_input("URL cannot be empty").into();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);

        let err: ApiError = ExtractError::UnsupportedPlatform.into();
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), "Platform tidak didukung");

        let err: ApiError = ExtractError::upstream(404, "gone").into();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }
}
