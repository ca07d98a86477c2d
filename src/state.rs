use std::sync::Arc;

use sqlx::SqlitePool;

use crate::config::{DeletePolicy, UnparseableOwnerFilter};
use crate::db::OverlayStore;
use crate::remote::TodoGateway;
use crate::services::{ChangeNotifier, MutationCoordinator, NoticeFeed, ReconciliationEngine};

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub gateway: Arc<dyn TodoGateway>,
    pub store: OverlayStore,
    pub engine: Arc<ReconciliationEngine>,
    pub mutations: Arc<MutationCoordinator>,
    pub notifier: ChangeNotifier,
    pub notices: NoticeFeed,
    pub owner_filter: UnparseableOwnerFilter,
}

impl AppState {
    /// Wires one overlay store, notifier and notice feed through every component.
    pub fn new(
        db: SqlitePool,
        gateway: Arc<dyn TodoGateway>,
        delete_policy: DeletePolicy,
        owner_filter: UnparseableOwnerFilter,
    ) -> Self {
        let store = OverlayStore::new(db.clone());
        let notifier = ChangeNotifier::new();
        let notices = NoticeFeed::new();

        let engine = ReconciliationEngine::new(gateway.clone(), store.clone(), delete_policy);
        let mutations = MutationCoordinator::new(
            gateway.clone(),
            store.clone(),
            notifier.clone(),
            Arc::new(notices.clone()),
            delete_policy,
        );

        Self {
            db,
            gateway,
            store,
            engine: Arc::new(engine),
            mutations: Arc::new(mutations),
            notifier,
            notices,
            owner_filter,
        }
    }
}
