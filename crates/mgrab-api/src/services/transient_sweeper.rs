//! Background service that removes stale transient download files.
//!
//! Runs one sweep at startup and then one per interval until shut down.

use std::time::Duration;

use mgrab_storage::TransientStore;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info, warn};

use crate::metrics::record_swept_files;

/// Shortest interval accepted; `tokio::time::interval` panics on zero.
const MIN_INTERVAL: Duration = Duration::from_secs(1);

/// Periodic transient file sweeper.
pub struct TransientSweeper {
    store: TransientStore,
    interval: Duration,
}

/// Handle to a running sweeper.
pub struct SweeperHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl TransientSweeper {
    pub fn new(store: TransientStore, interval: Duration) -> Self {
        Self {
            store,
            interval: interval.max(MIN_INTERVAL),
        }
    }

    /// Spawn the sweep loop.
    pub fn start(self) -> SweeperHandle {
        let (shutdown, rx) = watch::channel(false);
        let task = tokio::spawn(async move { self.run(rx).await });
        SweeperHandle { shutdown, task }
    }

    async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!(
            root = %self.store.root().display(),
            interval_secs = self.interval.as_secs(),
            max_age_secs = self.store.max_age().as_secs(),
            "Starting transient file sweeper"
        );

        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.sweep_once().await;
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!("Transient file sweeper stopped");
    }

    /// Run one sweep, logging instead of failing.
    pub async fn sweep_once(&self) -> usize {
        match self.store.sweep().await {
            Ok(removed) => {
                record_swept_files(removed);
                removed
            }
            Err(e) => {
                error!(error = %e, "Transient file sweep failed");
                0
            }
        }
    }
}

impl SweeperHandle {
    /// Signal the loop to stop and wait for it.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.task.await {
            warn!(error = %e, "Transient file sweeper task ended abnormally");
        }
    }
}
