//! Asset streaming proxy.
//!
//! Fetches a resolved asset from its origin with the headers that origin
//! expects and relays it as an attachment. In server mode the bytes pass
//! through a transient file that lives exactly as long as the response body;
//! in serverless mode they are buffered in memory under a hard ceiling.

use std::fmt::Display;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::Response;
use futures_util::{Stream, StreamExt};
use mgrab_extract::http::DESKTOP_UA;
use mgrab_extract::strategies::xiaohongshu;
use mgrab_extract::SoundCloudClient;
use mgrab_models::{sanitize_filename, Platform};
use mgrab_storage::TransientStore;
use reqwest::Client;
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;
use tracing::{debug, info, warn};

use crate::config::{ApiConfig, DeploymentMode};
use crate::error::{ApiError, ApiResult};
use crate::metrics::{record_proxied_bytes, record_proxy_rejection};

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";
const ASSET_ACCEPT: &str = "image/webp,image/apng,image/*,*/*;q=0.8";

/// Origin response with the content type to relay.
struct OriginAsset {
    response: reqwest::Response,
    content_type: String,
}

/// Streams origin assets back to the client.
pub struct AssetProxy {
    http: Client,
    soundcloud: Arc<SoundCloudClient>,
    store: TransientStore,
    mode: DeploymentMode,
    max_buffered_bytes: u64,
    max_buffered_mb: u64,
}

impl AssetProxy {
    pub fn new(config: &ApiConfig, soundcloud: Arc<SoundCloudClient>) -> ApiResult<Self> {
        let http = Client::builder()
            .timeout(config.asset_timeout)
            .connect_timeout(std::time::Duration::from_secs(10))
            .build()
            .map_err(|e| ApiError::internal(format!("HTTP client setup failed: {}", e)))?;

        Ok(Self {
            http,
            soundcloud,
            store: TransientStore::new(&config.temp_dir, config.temp_max_age),
            mode: config.deployment_mode,
            max_buffered_bytes: config.max_buffered_bytes(),
            max_buffered_mb: config.max_buffered_mb,
        })
    }

    pub fn mode(&self) -> DeploymentMode {
        self.mode
    }

    /// Fetch `url` for `platform` and relay it as `filename`.
    pub async fn relay(&self, platform: Platform, url: &str, filename: &str) -> ApiResult<Response> {
        info!(platform = %platform, filename = %filename, mode = %self.mode, "Proxying asset");
        let origin = self.open_origin(platform, url).await?;

        match self.mode {
            DeploymentMode::Server => self.relay_from_disk(platform, origin, filename).await,
            DeploymentMode::Serverless => self.relay_buffered(platform, origin, filename).await,
        }
    }

    async fn open_origin(&self, platform: Platform, url: &str) -> ApiResult<OriginAsset> {
        if platform == Platform::Soundcloud {
            let response = self.soundcloud.open_stream(url).await?;
            return Ok(OriginAsset {
                response,
                content_type: "audio/mpeg".to_string(),
            });
        }

        let mut request = self
            .http
            .get(url)
            .header("User-Agent", DESKTOP_UA)
            .header("Accept", ASSET_ACCEPT)
            .header("Accept-Language", "en-US,en;q=0.5");
        if platform == Platform::Xiaohongshu {
            request = request
                .header("Referer", xiaohongshu::REFERER)
                .header("Cookie", xiaohongshu::COOKIE);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ApiError::proxy_failed(e.status().map(|s| s.as_u16()), e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            warn!(platform = %platform, status = status.as_u16(), "Origin refused asset");
            return Err(ApiError::from_origin_status(
                status.as_u16(),
                format!("origin returned HTTP {}", status.as_u16()),
            ));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .unwrap_or(DEFAULT_CONTENT_TYPE)
            .to_string();

        Ok(OriginAsset {
            response,
            content_type,
        })
    }

    /// Write the origin body to a transient file, then stream the file back.
    ///
    /// The file guard moves into the body stream, so the file is removed when
    /// the body completes or is dropped. Any earlier error drops the guard too.
    async fn relay_from_disk(
        &self,
        platform: Platform,
        origin: OriginAsset,
        filename: &str,
    ) -> ApiResult<Response> {
        let (guard, mut file) = self.store.create(filename).await?;

        let mut stream = origin.response.bytes_stream();
        let mut written: u64 = 0;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| ApiError::proxy_failed(None, e.to_string()))?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;
        drop(file);

        debug!(path = %guard.path().display(), bytes = written, "Asset staged on disk");
        record_proxied_bytes(platform.as_str(), self.mode.as_str(), written);

        let reader = tokio::fs::File::open(guard.path()).await?;
        let body_stream = ReaderStream::new(reader).map(move |chunk| {
            let _owned = &guard;
            chunk
        });

        build_response(
            &origin.content_type,
            filename,
            Some(written),
            Body::from_stream(body_stream),
        )
    }

    /// Buffer the origin body in memory, refusing anything over the ceiling.
    async fn relay_buffered(
        &self,
        platform: Platform,
        origin: OriginAsset,
        filename: &str,
    ) -> ApiResult<Response> {
        if let Some(declared) = origin.response.content_length() {
            if declared > self.max_buffered_bytes {
                record_proxy_rejection(platform.as_str());
                return Err(ApiError::PayloadTooLarge {
                    max_mb: self.max_buffered_mb,
                });
            }
        }

        let bytes = collect_with_limit(origin.response.bytes_stream(), self.max_buffered_bytes)
            .await
            .map_err(|e| match e {
                CollectError::TooLarge => {
                    record_proxy_rejection(platform.as_str());
                    ApiError::PayloadTooLarge {
                        max_mb: self.max_buffered_mb,
                    }
                }
                CollectError::Stream(msg) => ApiError::proxy_failed(None, msg),
            })?;

        record_proxied_bytes(platform.as_str(), self.mode.as_str(), bytes.len() as u64);
        let len = bytes.len() as u64;
        build_response(&origin.content_type, filename, Some(len), Body::from(bytes))
    }
}

#[derive(Debug, PartialEq)]
pub(crate) enum CollectError {
    TooLarge,
    Stream(String),
}

/// Collect a byte stream, failing as soon as it exceeds `limit` bytes.
/// A stream of exactly `limit` bytes succeeds.
pub(crate) async fn collect_with_limit<S, B, E>(mut stream: S, limit: u64) -> Result<Vec<u8>, CollectError>
where
    S: Stream<Item = Result<B, E>> + Unpin,
    B: AsRef<[u8]>,
    E: Display,
{
    let mut buf = Vec::new();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| CollectError::Stream(e.to_string()))?;
        let chunk = chunk.as_ref();
        if buf.len() as u64 + chunk.len() as u64 > limit {
            return Err(CollectError::TooLarge);
        }
        buf.extend_from_slice(chunk);
    }
    Ok(buf)
}

/// `attachment` disposition with an ASCII fallback and an RFC 5987 name.
pub fn content_disposition(filename: &str) -> String {
    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        sanitize_filename(filename),
        urlencoding::encode(filename)
    )
}

fn build_response(
    content_type: &str,
    filename: &str,
    content_length: Option<u64>,
    body: Body,
) -> ApiResult<Response> {
    let content_type = HeaderValue::from_str(content_type)
        .unwrap_or_else(|_| HeaderValue::from_static(DEFAULT_CONTENT_TYPE));

    let mut builder = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CONTENT_DISPOSITION, content_disposition(filename));
    if let Some(len) = content_length {
        builder = builder.header(header::CONTENT_LENGTH, len);
    }

    builder
        .body(body)
        .map_err(|e| ApiError::internal(format!("Failed to build response: {}", e)))
}
