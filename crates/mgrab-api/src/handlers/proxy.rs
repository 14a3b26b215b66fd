//! `GET /api/download/:platform/:filename?fileUrl=`: relay one asset.

use axum::extract::{Path, Query, State};
use axum::response::Response;
use mgrab_models::Platform;
use serde::Deserialize;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ProxyQuery {
    #[serde(rename = "fileUrl")]
    pub file_url: Option<String>,
}

pub async fn proxy_asset(
    State(state): State<AppState>,
    Path((platform, filename)): Path<(String, String)>,
    Query(query): Query<ProxyQuery>,
) -> ApiResult<Response> {
    let file_url = query
        .file_url
        .filter(|u| !u.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("File URL is required"))?;

    let platform: Platform = platform
        .parse()
        .map_err(|_| ApiError::bad_request(format!("Unsupported platform: {}", platform)))?;

    state.proxy.relay(platform, file_url.trim(), &filename).await
}
