use std::time::Duration;

use tracing::{debug, info, warn};

use crate::db::OverlayStore;
use crate::services::notify::ChangeNotifier;

/// Polls the overlay's storage revision and re-broadcasts writes made by
/// other processes sharing the same database.
pub struct StorageWatcher {
    store: OverlayStore,
    notifier: ChangeNotifier,
    interval: Duration,
}

impl StorageWatcher {
    pub fn new(store: OverlayStore, notifier: ChangeNotifier, interval: Duration) -> Self {
        Self {
            store,
            notifier,
            interval,
        }
    }

    /// Runs until the task is dropped or aborted.
    pub async fn start(self) {
        info!("Starting overlay storage watcher (interval: {:?})", self.interval);

        let mut last_seen = match self.store.revision().await {
            Ok(revision) => revision,
            Err(e) => {
                warn!("Overlay revision unavailable at start: {}", e);
                0
            }
        };

        loop {
            tokio::time::sleep(self.interval).await;

            match self.poll(last_seen).await {
                Some(revision) => last_seen = revision,
                None => continue,
            }
        }
    }

    /// Returns the new revision when it moved since `last_seen`.
    async fn poll(&self, last_seen: i64) -> Option<i64> {
        let revision = match self.store.revision().await {
            Ok(revision) => revision,
            Err(e) => {
                // Keep polling; storage may come back.
                warn!("Overlay revision check failed: {}", e);
                return None;
            }
        };
        if revision == last_seen {
            return None;
        }

        if revision != self.store.local_revision() {
            debug!("Overlay changed elsewhere (revision {} -> {})", last_seen, revision);
            self.notifier.broadcast_change();
        }
        Some(revision)
    }
}
