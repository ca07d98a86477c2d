use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::Utc;
use serde::Serialize;
use serde::de::DeserializeOwned;
use sqlx::SqlitePool;
use tracing::{error, warn};

use crate::error::StorageError;
use crate::models::Todo;

pub const LOCAL_TODOS_KEY: &str = "local_todos";
pub const TOMBSTONES_KEY: &str = "deleted_todo_ids";

/// The locally persisted overlay. Every value is a whole JSON blob under one
/// key, and every write replaces the whole blob.
#[derive(Clone)]
pub struct OverlayStore {
    db: SqlitePool,
    local_revision: Arc<AtomicI64>,
}

impl OverlayStore {
    pub fn new(db: SqlitePool) -> Self {
        Self {
            db,
            local_revision: Arc::new(AtomicI64::new(-1)),
        }
    }

    /// Never fails: missing, unreadable, or malformed storage reads as empty.
    pub async fn read_all(&self) -> Vec<Todo> {
        match self.try_read_all().await {
            Ok(todos) => todos,
            Err(e) => {
                warn!("Overlay unreadable, treating as empty: {}", e);
                Vec::new()
            }
        }
    }

    /// Storage failures are logged and dropped.
    pub async fn write_all(&self, todos: &[Todo]) {
        if let Err(e) = self.try_write_all(todos).await {
            error!("Failed to save overlay ({} todos): {}", todos.len(), e);
        }
    }

    pub async fn clear(&self) {
        if let Err(e) = self.try_clear().await {
            error!("Failed to clear overlay: {}", e);
        }
    }

    pub async fn try_read_all(&self) -> Result<Vec<Todo>, StorageError> {
        Ok(self.read_key(LOCAL_TODOS_KEY).await?.unwrap_or_default())
    }

    pub async fn try_write_all(&self, todos: &[Todo]) -> Result<(), StorageError> {
        self.write_key(LOCAL_TODOS_KEY, &todos).await
    }

    pub async fn try_clear(&self) -> Result<(), StorageError> {
        let mut tx = self.db.begin().await?;
        sqlx::query("DELETE FROM kv_store WHERE key IN (?1, ?2)")
            .bind(LOCAL_TODOS_KEY)
            .bind(TOMBSTONES_KEY)
            .execute(&mut *tx)
            .await?;
        let revision = bump_revision(&mut tx).await?;
        tx.commit().await?;

        self.local_revision.store(revision, Ordering::SeqCst);
        Ok(())
    }

    pub async fn read_tombstones(&self) -> Vec<i64> {
        match self.read_key(TOMBSTONES_KEY).await {
            Ok(ids) => ids.unwrap_or_default(),
            Err(e) => {
                warn!("Tombstones unreadable, treating as empty: {}", e);
                Vec::new()
            }
        }
    }

    pub async fn write_tombstones(&self, ids: &[i64]) {
        if let Err(e) = self.write_key(TOMBSTONES_KEY, &ids).await {
            error!("Failed to save tombstones: {}", e);
        }
    }

    /// Storage-wide revision, bumped by every write from any process.
    pub async fn revision(&self) -> Result<i64, StorageError> {
        let revision = sqlx::query_scalar::<_, i64>("SELECT revision FROM kv_meta WHERE id = 1")
            .fetch_one(&self.db)
            .await?;
        Ok(revision)
    }

    /// Revision produced by this process's most recent write, or -1.
    pub fn local_revision(&self) -> i64 {
        self.local_revision.load(Ordering::SeqCst)
    }

    async fn read_key<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        let raw = sqlx::query_scalar::<_, String>("SELECT value FROM kv_store WHERE key = ?1")
            .bind(key)
            .fetch_optional(&self.db)
            .await?;

        match raw {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    async fn write_key<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
    ) -> Result<(), StorageError> {
        let raw = serde_json::to_string(value)?;
        let now = Utc::now().to_rfc3339();

        let mut tx = self.db.begin().await?;
        sqlx::query(
            r#"
            INSERT INTO kv_store (key, value, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(raw)
        .bind(now)
        .execute(&mut *tx)
        .await?;
        let revision = bump_revision(&mut tx).await?;
        tx.commit().await?;

        self.local_revision.store(revision, Ordering::SeqCst);
        Ok(())
    }
}

async fn bump_revision(tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>) -> Result<i64, StorageError> {
    let revision = sqlx::query_scalar::<_, i64>(
        "UPDATE kv_meta SET revision = revision + 1 WHERE id = 1 RETURNING revision",
    )
    .fetch_one(&mut **tx)
    .await?;
    Ok(revision)
}
