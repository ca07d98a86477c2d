use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::DeletePolicy;
use crate::db::OverlayStore;
use crate::error::RemoteError;
use crate::models::{NewTodoRequest, Todo, UNKNOWN_OWNER, UpdateTodoRequest};
use crate::remote::TodoGateway;
use crate::services::notify::{ChangeNotifier, Notice, NoticeSink};

/// Runs create/update/delete. The remote leg may fail; the local leg always
/// lands in the overlay and always signals a change.
pub struct MutationCoordinator {
    gateway: Arc<dyn TodoGateway>,
    store: OverlayStore,
    notifier: ChangeNotifier,
    notices: Arc<dyn NoticeSink>,
    delete_policy: DeletePolicy,
}

impl MutationCoordinator {
    pub fn new(
        gateway: Arc<dyn TodoGateway>,
        store: OverlayStore,
        notifier: ChangeNotifier,
        notices: Arc<dyn NoticeSink>,
        delete_policy: DeletePolicy,
    ) -> Self {
        Self {
            gateway,
            store,
            notifier,
            notices,
            delete_policy,
        }
    }

    pub async fn create(&self, req: NewTodoRequest) -> Todo {
        let remote = self.gateway.create(&req).await;

        let now = Utc::now().to_rfc3339();
        let mut overlay = self.store.read_all().await;
        let todo = match remote {
            Ok(created) => {
                info!("Remote create accepted: {:?}", created.id);
                let id = match created.id {
                    Some(id) if id > 0 && !overlay.iter().any(|t| t.id == id) => id,
                    Some(id) if id > 0 => {
                        warn!("Remote id {} already used locally, assigning a local id", id);
                        next_local_id(&overlay)
                    }
                    _ => next_local_id(&overlay),
                };
                Todo {
                    id,
                    todo: created.todo,
                    completed: created.completed,
                    user_id: created.user_id,
                    created_at: Some(now.clone()),
                    updated_at: Some(now),
                    pending_changes: None,
                }
            }
            Err(e) => {
                warn!("Remote create failed, creating locally only: {}", e);
                Todo {
                    id: next_local_id(&overlay),
                    todo: req.todo,
                    completed: req.completed,
                    user_id: req.user_id,
                    created_at: Some(now.clone()),
                    updated_at: Some(now),
                    pending_changes: None,
                }
            }
        };

        overlay.insert(0, todo.clone());
        self.store.write_all(&overlay).await;
        self.lift_tombstone(todo.id).await;

        self.notifier.broadcast_change();
        self.notices.success(Notice::new(
            "Todo created",
            format!("Todo created successfully! ID: {}", todo.id),
        ));
        todo
    }

    pub async fn update(&self, id: i64, req: UpdateTodoRequest) -> Todo {
        let (known, remote) = self.remote_update(id, &req).await;
        let remote = match remote {
            Ok(todo) => Some(todo),
            Err(e) if e.is_not_found() => {
                warn!("Todo {} not found on server, updating locally only", id);
                None
            }
            Err(e) => {
                warn!("Remote update of {} failed, updating locally only: {}", id, e);
                None
            }
        };
        let base = remote.or(known);

        let now = Utc::now().to_rfc3339();
        let mut overlay = self.store.read_all().await;
        let updated = match overlay.iter_mut().find(|t| t.id == id) {
            Some(entry) => {
                if entry.is_provisional() {
                    match base {
                        Some(base) => *entry = entry.settled_on(base),
                        None => {
                            if let Some(pending) = entry.pending_changes.as_mut() {
                                pending.combine(&req);
                            }
                        }
                    }
                }
                entry.apply(&req);
                entry.updated_at = Some(now);
                entry.clone()
            }
            None => {
                let mut record = match base {
                    Some(base) => base,
                    None => {
                        info!("Nothing known about todo {}, keeping the changes provisional", id);
                        let mut record = placeholder(id);
                        record.pending_changes = Some(req.clone());
                        record
                    }
                };
                record.id = id;
                record.apply(&req);
                record.updated_at = Some(now);
                overlay.push(record.clone());
                record
            }
        };

        self.store.write_all(&overlay).await;
        self.lift_tombstone(id).await;

        self.notifier.broadcast_change();
        self.notices.success(Notice::new(
            "Todo updated",
            format!("Todo updated successfully! ID: {}", id),
        ));
        updated
    }

    pub async fn delete(&self, id: i64) -> Todo {
        let remote = match self.gateway.get(id).await {
            Ok(_) => self.gateway.delete(id).await,
            Err(e) => Err(e),
        };
        let remote = match remote {
            Ok(todo) => Some(todo),
            Err(e) if e.is_not_found() => {
                warn!("Todo {} not found on server, deleting locally only", id);
                None
            }
            Err(e) => {
                warn!("Remote delete of {} failed, deleting locally only: {}", id, e);
                None
            }
        };

        let mut overlay = self.store.read_all().await;
        let removed = overlay
            .iter()
            .position(|t| t.id == id)
            .map(|idx| overlay.remove(idx));
        self.store.write_all(&overlay).await;

        if self.delete_policy == DeletePolicy::Tombstone {
            let mut tombstones = self.store.read_tombstones().await;
            if !tombstones.contains(&id) {
                tombstones.push(id);
                self.store.write_tombstones(&tombstones).await;
            }
        }

        self.notifier.broadcast_change();
        self.notices.success(Notice::new(
            "Todo deleted",
            format!("Todo deleted successfully! ID: {}", id),
        ));
        match (removed, remote) {
            (Some(local), Some(remote)) if local.is_provisional() => local.settled_on(remote),
            (Some(local), _) => local,
            (None, Some(remote)) => remote,
            (None, None) => placeholder(id),
        }
    }

    /// Drops every overlay record (and tombstone).
    pub async fn clear(&self) {
        self.store.clear().await;
        self.notifier.broadcast_change();
        self.notices.success(Notice::new(
            "Local todos cleared",
            "All locally stored todos were removed".to_string(),
        ));
    }

    /// Existence check, then update. Returns whatever the check learned
    /// alongside the outcome of the update itself.
    async fn remote_update(
        &self,
        id: i64,
        req: &UpdateTodoRequest,
    ) -> (Option<Todo>, Result<Todo, RemoteError>) {
        match self.gateway.get(id).await {
            Ok(existing) => {
                let outcome = self.gateway.update(id, req).await;
                (Some(existing), outcome)
            }
            Err(e) => (None, Err(e)),
        }
    }

    async fn lift_tombstone(&self, id: i64) {
        if self.delete_policy != DeletePolicy::Tombstone {
            return;
        }
        let mut tombstones = self.store.read_tombstones().await;
        let before = tombstones.len();
        tombstones.retain(|t| *t != id);
        if tombstones.len() != before {
            self.store.write_tombstones(&tombstones).await;
        }
    }
}

/// Stand-in for a record nobody knows anything about. The owner is
/// `UNKNOWN_OWNER`, which no valid user id can equal.
fn placeholder(id: i64) -> Todo {
    Todo {
        id,
        todo: "Unknown".to_string(),
        completed: false,
        user_id: UNKNOWN_OWNER,
        created_at: None,
        updated_at: None,
        pending_changes: None,
    }
}

/// Millisecond timestamp plus random jitter, bumped past any id already in the overlay.
fn next_local_id(taken: &[Todo]) -> i64 {
    let jitter = (Uuid::new_v4().as_u128() % 1000) as i64;
    let mut id = Utc::now().timestamp_millis() + jitter;
    while taken.iter().any(|t| t.id == id) {
        id += 1;
    }
    id
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_id_is_positive_and_free() {
        let first = next_local_id(&[]);
        assert!(first > 0);

        let taken: Vec<Todo> = (0..1000).map(|n| placeholder(first + n)).collect();
        let second = next_local_id(&taken);
        assert!(second > 0);
        assert!(!taken.iter().any(|t| t.id == second));
    }
}
