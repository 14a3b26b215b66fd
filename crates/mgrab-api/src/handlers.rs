//! Request handlers.

pub mod health;
pub mod proxy;
pub mod resolve;

pub use health::*;
pub use proxy::*;
pub use resolve::*;

use crate::error::ApiError;

/// Fallback for unmatched routes.
pub async fn not_found() -> ApiError {
    ApiError::RouteNotFound
}
