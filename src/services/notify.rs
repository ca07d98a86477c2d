use serde::Serialize;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, info};

const CHANNEL_CAPACITY: usize = 64;

/// "Something in the overlay may have changed." Carries nothing; observers re-read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChangeSignal;

/// Process-wide, fire-and-forget change signal.
#[derive(Clone)]
pub struct ChangeNotifier {
    tx: broadcast::Sender<ChangeSignal>,
}

impl Default for ChangeNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl ChangeNotifier {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx }
    }

    pub fn broadcast_change(&self) {
        // No observers is not an error.
        let observers = self.tx.send(ChangeSignal).unwrap_or(0);
        debug!("Overlay change broadcast to {} observers", observers);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChangeSignal> {
        self.tx.subscribe()
    }

    /// Run `callback` once per received signal until the notifier is dropped.
    /// A slow observer that lagged behind gets a single call for everything it missed.
    pub fn on_change<F>(&self, callback: F) -> JoinHandle<()>
    where
        F: Fn() + Send + 'static,
    {
        let mut rx = self.subscribe();
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(ChangeSignal) => callback(),
                    Err(RecvError::Lagged(skipped)) => {
                        debug!("Change observer lagged, {} signals collapsed", skipped);
                        callback();
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        })
    }
}

/// User-facing success message, the equivalent of a toast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub title: String,
    pub description: String,
}

impl Notice {
    pub fn new(title: &str, description: String) -> Self {
        Self {
            title: title.to_string(),
            description,
        }
    }
}

pub trait NoticeSink: Send + Sync {
    fn success(&self, notice: Notice);
}

/// Logs every notice and fans it out to live subscribers.
#[derive(Clone)]
pub struct NoticeFeed {
    tx: broadcast::Sender<Notice>,
}

impl Default for NoticeFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl NoticeFeed {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notice> {
        self.tx.subscribe()
    }
}

impl NoticeSink for NoticeFeed {
    fn success(&self, notice: Notice) {
        info!("{}: {}", notice.title, notice.description);
        let _ = self.tx.send(notice);
    }
}
