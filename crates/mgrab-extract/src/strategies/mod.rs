//! Per-platform extraction strategies.

pub mod capcut;
pub mod sanitize;
pub mod soundcloud;
pub mod threads;
pub mod tiktok;
pub mod xiaohongshu;

pub use capcut::CapCutExtractor;
pub use soundcloud::{SoundCloudClient, SoundCloudExtractor};
pub use threads::ThreadsExtractor;
pub use tiktok::{TikTokExtractor, TikTokSource};
pub use xiaohongshu::XiaohongshuExtractor;
