//! `POST /api/download`: turn a page URL into downloadable media.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use mgrab_models::ExtractionResult;
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ResolveRequest {
    #[serde(default)]
    pub url: Option<String>,
}

/// Resolve a URL. A missing or malformed body is treated as an empty URL.
pub async fn resolve_media(
    State(state): State<AppState>,
    payload: Result<Json<ResolveRequest>, JsonRejection>,
) -> ApiResult<Json<ExtractionResult>> {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            debug!(error = %rejection, "Unreadable resolve body");
            ResolveRequest::default()
        }
    };
    let url = request.url.unwrap_or_default();

    info!(url = %url, "Resolving media");
    let result = state.resolver.resolve(&url).await?;
    Ok(Json(result))
}
