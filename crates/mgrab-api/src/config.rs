//! API configuration.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// How proxied assets are relayed to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeploymentMode {
    /// Long-running process: assets pass through a transient file on disk.
    Server,
    /// Request-scoped runtime: assets are buffered in memory under a ceiling.
    Serverless,
}

impl DeploymentMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeploymentMode::Server => "server",
            DeploymentMode::Serverless => "serverless",
        }
    }

    /// Anything other than `serverless` selects server mode.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "serverless" => DeploymentMode::Serverless,
            _ => DeploymentMode::Server,
        }
    }
}

impl fmt::Display for DeploymentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// CORS origins
    pub cors_origins: Vec<String>,
    /// Max request body size
    pub max_body_size: usize,
    /// Asset relay mode
    pub deployment_mode: DeploymentMode,
    /// Root directory for transient files
    pub temp_dir: PathBuf,
    /// Interval between transient file sweeps
    pub sweep_interval: Duration,
    /// Age after which a transient file is swept
    pub temp_max_age: Duration,
    /// Buffered-mode ceiling in megabytes
    pub max_buffered_mb: u64,
    /// Timeout for a whole asset transfer
    pub asset_timeout: Duration,
    /// Optional front-end directory served at `/`
    pub static_dir: Option<PathBuf>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3921,
            cors_origins: vec!["*".to_string()],
            max_body_size: 1024 * 1024, // 1MB
            deployment_mode: DeploymentMode::Server,
            temp_dir: PathBuf::from("temp/downloads"),
            sweep_interval: Duration::from_secs(3600),
            temp_max_age: Duration::from_secs(3600),
            max_buffered_mb: 45,
            asset_timeout: Duration::from_secs(600),
            static_dir: None,
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.parse().ok())
}

impl ApiConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: std::env::var("API_HOST").unwrap_or(defaults.host),
            port: env_parse("API_PORT").unwrap_or(defaults.port),
            cors_origins: std::env::var("CORS_ORIGINS")
                .map(|s| s.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or(defaults.cors_origins),
            max_body_size: env_parse("MAX_BODY_SIZE").unwrap_or(defaults.max_body_size),
            deployment_mode: std::env::var("DEPLOYMENT_MODE")
                .map(|v| DeploymentMode::parse(&v))
                .unwrap_or(defaults.deployment_mode),
            temp_dir: std::env::var("TEMP_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.temp_dir),
            sweep_interval: env_parse("TEMP_SWEEP_INTERVAL_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.sweep_interval),
            temp_max_age: env_parse("TEMP_MAX_AGE_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.temp_max_age),
            max_buffered_mb: env_parse("MAX_BUFFERED_MB").unwrap_or(defaults.max_buffered_mb),
            asset_timeout: env_parse("ASSET_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.asset_timeout),
            static_dir: std::env::var("STATIC_DIR")
                .ok()
                .filter(|s| !s.is_empty())
                .map(PathBuf::from),
        }
    }

    /// Buffered-mode ceiling in bytes.
    pub fn max_buffered_bytes(&self) -> u64 {
        self.max_buffered_mb.saturating_mul(1024 * 1024)
    }
}
