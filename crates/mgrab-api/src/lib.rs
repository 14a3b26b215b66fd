//! Axum HTTP API server.
//!
//! This crate provides:
//! - URL resolution into downloadable media (`POST /api/download`)
//! - Asset streaming proxy in disk or buffered mode
//! - Periodic sweeping of transient download files
//! - Security headers, request ids and Prometheus metrics

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod state;

pub use config::{ApiConfig, DeploymentMode};
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use services::{AssetProxy, SweeperHandle, TransientSweeper};
pub use state::AppState;
