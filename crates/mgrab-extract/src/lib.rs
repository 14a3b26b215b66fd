//! URL classification and per-platform media extraction.
//!
//! This crate provides:
//! - URL normalization and platform classification
//! - One extraction strategy per platform behind the [`Extractor`] trait
//! - The TikTok fallback chain and redirect resolution
//! - The authenticated SoundCloud client used by the asset proxy

pub mod classifier;
pub mod config;
pub mod error;
pub mod http;
pub mod metrics;
pub mod normalize;
pub mod resolver;
pub mod strategies;
pub mod traits;

pub use classifier::PlatformClassifier;
pub use config::ExtractorConfig;
pub use error::{ExtractError, ExtractResult};
pub use normalize::normalize_url;
pub use resolver::MediaResolver;
pub use strategies::soundcloud::SoundCloudClient;
pub use traits::Extractor;
