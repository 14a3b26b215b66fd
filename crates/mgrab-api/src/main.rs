//! mediagrab API server.

use std::net::SocketAddr;

use anyhow::Context;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use mgrab_api::{create_router, metrics, ApiConfig, AppState, DeploymentMode, TransientSweeper};
use mgrab_extract::ExtractorConfig;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // rustls 0.23 needs an explicit process-wide provider
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        eprintln!("rustls crypto provider was already installed");
    }

    init_tracing();

    if let Err(e) = run().await {
        error!("mgrab-api failed: {:#}", e);
        std::process::exit(1);
    }
}

/// JSON lines when `LOG_FORMAT=json`, coloured text otherwise.
fn init_tracing() {
    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("mgrab_api=info,mgrab_extract=info,mgrab_storage=info"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json().with_current_span(false)).init();
    } else {
        registry.with(fmt::layer().with_target(true)).init();
    }
}

async fn run() -> anyhow::Result<()> {
    let config = ApiConfig::from_env();
    info!(
        host = %config.host,
        port = config.port,
        mode = %config.deployment_mode,
        temp_dir = %config.temp_dir.display(),
        "Starting mgrab-api"
    );

    let state = AppState::new(config.clone(), ExtractorConfig::from_env())
        .context("failed to build application state")?;

    let metrics_enabled = std::env::var("METRICS_ENABLED")
        .map(|v| v == "true" || v == "1")
        .unwrap_or(true);
    let metrics_handle = metrics_enabled.then(metrics::init_metrics);

    // Serverless mode never writes transient files
    let sweeper = (config.deployment_mode == DeploymentMode::Server)
        .then(|| TransientSweeper::new(state.store.clone(), config.sweep_interval).start());

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .with_context(|| format!("invalid bind address {}:{}", config.host, config.port))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!(%addr, metrics = metrics_enabled, "Listening");

    let served = axum::serve(listener, create_router(state, metrics_handle))
        .with_graceful_shutdown(shutdown_signal())
        .await;

    if let Some(handle) = sweeper {
        handle.shutdown().await;
    }
    served.context("server error")?;

    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Received shutdown signal"),
        Err(e) => {
            error!("Failed to listen for shutdown signal: {}", e);
            std::future::pending::<()>().await;
        }
    }
}
