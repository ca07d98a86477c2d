pub mod mutation;
pub mod notify;
pub mod reconcile;
pub mod watcher;

pub use mutation::MutationCoordinator;
pub use notify::{ChangeNotifier, ChangeSignal, Notice, NoticeFeed, NoticeSink};
pub use reconcile::ReconciliationEngine;
pub use watcher::StorageWatcher;
