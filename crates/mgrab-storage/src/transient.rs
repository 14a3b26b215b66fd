//! Transient files backing disk-mode downloads.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use chrono::Utc;
use mgrab_models::sanitize_filename;
use tokio::fs;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{StorageError, StorageResult};

/// Storage root plus the age after which leftovers are swept.
#[derive(Debug, Clone)]
pub struct TransientStore {
    root: PathBuf,
    max_age: Duration,
}

impl TransientStore {
    pub fn new(root: impl Into<PathBuf>, max_age: Duration) -> Self {
        Self {
            root: root.into(),
            max_age,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn max_age(&self) -> Duration {
        self.max_age
    }

    /// Create an empty transient file named
    /// `<unix-millis>-<nonce>-<sanitized filename>`.
    ///
    /// The returned guard deletes the file when dropped.
    pub async fn create(&self, filename: &str) -> StorageResult<(TransientFile, fs::File)> {
        fs::create_dir_all(&self.root)
            .await
            .map_err(|source| StorageError::RootUnavailable {
                path: self.root.clone(),
                source,
            })?;

        let nonce = Uuid::new_v4().simple().to_string();
        let name = format!(
            "{}-{}-{}",
            Utc::now().timestamp_millis(),
            &nonce[..8],
            sanitize_filename(filename)
        );
        let path = self.root.join(name);

        let file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .map_err(StorageError::CreateFailed)?;

        debug!(path = %path.display(), "Created transient file");
        Ok((TransientFile { path }, file))
    }

    /// Delete a file, ignoring a missing one. Never fails.
    pub async fn delete(&self, path: &Path) -> bool {
        match fs::remove_file(path).await {
            Ok(()) => {
                debug!(path = %path.display(), "Deleted transient file");
                true
            }
            Err(e) if e.kind() == ErrorKind::NotFound => false,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to delete transient file");
                false
            }
        }
    }

    /// Delete every file older than `max_age`. Returns how many were removed.
    ///
    /// A missing root is an empty sweep. Entries that disappear mid-sweep are
    /// skipped.
    pub async fn sweep(&self) -> StorageResult<usize> {
        let mut entries = match fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };

        let now = SystemTime::now();
        let mut removed = 0;

        while let Some(entry) = entries.next_entry().await? {
            let metadata = match entry.metadata().await {
                Ok(m) => m,
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => {
                    warn!(path = %entry.path().display(), error = %e, "Failed to stat transient entry");
                    continue;
                }
            };
            if !metadata.is_file() {
                continue;
            }

            let expired = metadata
                .modified()
                .ok()
                .and_then(|mtime| now.duration_since(mtime).ok())
                .is_some_and(|age| age > self.max_age);

            if expired && self.delete(&entry.path()).await {
                removed += 1;
            }
        }

        if removed > 0 {
            info!(removed, root = %self.root.display(), "Swept expired transient files");
        }
        Ok(removed)
    }
}

/// Owns a transient file on disk; removes it on drop.
#[derive(Debug)]
pub struct TransientFile {
    path: PathBuf,
}

impl TransientFile {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

// Drop cannot await, so this is a blocking unlink on whatever thread drops
// the guard. One unlink per response; bulk removal goes through
// `TransientStore::delete` and `sweep`, which use `tokio::fs`.
impl Drop for TransientFile {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "Released transient file"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!(path = %self.path.display(), error = %e, "Failed to release transient file"),
        }
    }
}
