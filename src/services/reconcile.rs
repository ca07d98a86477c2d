use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::DeletePolicy;
use crate::db::OverlayStore;
use crate::models::{Scope, Todo, TodosPage};
use crate::remote::TodoGateway;

/// Merges the remote snapshot with the local overlay into one view per query.
pub struct ReconciliationEngine {
    gateway: Arc<dyn TodoGateway>,
    store: OverlayStore,
    delete_policy: DeletePolicy,
}

impl ReconciliationEngine {
    pub fn new(
        gateway: Arc<dyn TodoGateway>,
        store: OverlayStore,
        delete_policy: DeletePolicy,
    ) -> Self {
        Self {
            gateway,
            store,
            delete_policy,
        }
    }

    /// Never fails. A remote failure degrades to the overlay records in scope.
    pub async fn merged_list(&self, scope: Scope, limit: usize, skip: usize) -> TodosPage {
        let remote = match scope {
            Scope::All => self.gateway.list(limit, skip).await,
            Scope::Owner(user_id) => self.gateway.list_by_owner(user_id, limit, skip).await,
        };
        let remote_todos = match remote {
            Ok(page) => page.todos,
            Err(e) => {
                warn!("Remote list for {:?} failed, showing local todos only: {}", scope, e);
                Vec::new()
            }
        };

        let overlay = self.store.read_all().await;
        let tombstones = self.tombstones().await;
        let todos = merge(remote_todos, overlay, scope, &tombstones);
        debug!("Merged view for {:?} has {} todos", scope, todos.len());

        TodosPage {
            total: todos.len(),
            todos,
            skip,
            limit,
        }
    }

    /// Overlay first; the remote is only asked when the overlay has no such id,
    /// or holds a provisional record that needs a known copy to settle on.
    pub async fn single_todo(&self, id: i64) -> Option<Todo> {
        if let Some(local) = self.store.read_all().await.into_iter().find(|t| t.id == id) {
            if !local.is_provisional() {
                return Some(local);
            }
            return match self.gateway.get(id).await {
                Ok(known) => Some(local.settled_on(known)),
                Err(e) => {
                    debug!("No known copy of provisional todo {}: {}", id, e);
                    Some(local)
                }
            };
        }
        if self.tombstones().await.contains(&id) {
            return None;
        }

        match self.gateway.get(id).await {
            Ok(todo) => Some(todo),
            Err(e) if e.is_not_found() => None,
            Err(e) => {
                warn!("Remote lookup of todo {} failed: {}", id, e);
                None
            }
        }
    }

    async fn tombstones(&self) -> Vec<i64> {
        match self.delete_policy {
            DeletePolicy::Forget => Vec::new(),
            DeletePolicy::Tombstone => self.store.read_tombstones().await,
        }
    }
}

/// Whole-record override by id. Overlay records that replace a remote record
/// keep the remote position; the rest go in front, in overlay order.
///
/// Ids are matched before the scope is applied, so an overlay record that left
/// the scope also takes its remote copy out of the view. A provisional overlay
/// record is settled on its remote copy; without one its owner is unknown and
/// it only shows up in the unscoped view.
pub fn merge(
    remote: Vec<Todo>,
    overlay: Vec<Todo>,
    scope: Scope,
    tombstones: &[i64],
) -> Vec<Todo> {
    let positions: HashMap<i64, usize> = remote
        .iter()
        .enumerate()
        .map(|(idx, todo)| (todo.id, idx))
        .collect();
    let mut merged: Vec<Option<Todo>> = remote.into_iter().map(Some).collect();

    let mut front: Vec<Todo> = Vec::new();
    let mut front_positions: HashMap<i64, usize> = HashMap::new();

    for local in overlay {
        if let Some(&idx) = positions.get(&local.id) {
            let resolved = match &merged[idx] {
                Some(known) if local.is_provisional() => local.settled_on(known.clone()),
                _ => local,
            };
            merged[idx] = resolved.matches(scope).then_some(resolved);
            continue;
        }

        let visible = if local.is_provisional() {
            scope == Scope::All
        } else {
            local.matches(scope)
        };
        if !visible {
            continue;
        }
        if let Some(&idx) = front_positions.get(&local.id) {
            front[idx] = local;
        } else {
            front_positions.insert(local.id, front.len());
            front.push(local);
        }
    }

    front.extend(merged.into_iter().flatten());
    if !tombstones.is_empty() {
        front.retain(|t| !tombstones.contains(&t.id));
    }
    front
}
