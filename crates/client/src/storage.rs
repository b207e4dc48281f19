//! Durable client-side storage for the session (token, user record, company id).
//!
//! Only the session store writes here; API wrappers read the token. Values are
//! opaque strings, exactly as the web client kept them in local storage.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::Context;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};
use thiserror::Error;
use tokio::sync::Mutex;

/// The keys the session layer persists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKey {
    /// Raw bearer token.
    Token,
    /// JSON-serialized current user.
    User,
    /// Firm id, written for company-scoped roles only.
    CompanyId,
}

impl StorageKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageKey::Token => "token",
            StorageKey::User => "user",
            StorageKey::CompanyId => "companyId",
        }
    }
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage backend failed: {0:#}")]
    Backend(#[from] anyhow::Error),
}

/// Key-value persistence surviving restarts.
#[async_trait]
pub trait Storage: Send + Sync {
    async fn get(&self, key: StorageKey) -> Result<Option<String>, StorageError>;
    async fn set(&self, key: StorageKey, value: &str) -> Result<(), StorageError>;
    async fn remove(&self, key: StorageKey) -> Result<(), StorageError>;
}

// ─────────────────────────────────────────────────────────────────────────────
// In-memory
// ─────────────────────────────────────────────────────────────────────────────

/// Process-local storage. Counts mutations so callers can observe writes.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: std::sync::Mutex<HashMap<StorageKey, String>>,
    writes: AtomicUsize,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `set`/`remove` calls so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<StorageKey, String>> {
        // A poisoned map is still a valid map.
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn get(&self, key: StorageKey) -> Result<Option<String>, StorageError> {
        Ok(self.entries().get(&key).cloned())
    }

    async fn set(&self, key: StorageKey, value: &str) -> Result<(), StorageError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.entries().insert(key, value.to_string());
        Ok(())
    }

    async fn remove(&self, key: StorageKey) -> Result<(), StorageError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.entries().remove(&key);
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// SQLite
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
enum Location {
    File(PathBuf),
    Memory,
}

/// SQLite-backed storage (one `session_store` key-value table).
///
/// Cheap to clone; clones share one lazily-opened pool.
#[derive(Debug, Clone)]
pub struct SqliteStorage {
    location: Location,
    pool: Arc<Mutex<Option<SqlitePool>>>,
}

impl SqliteStorage {
    /// Storage at an explicit database file (created if missing).
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self {
            location: Location::File(path.into()),
            pool: Arc::new(Mutex::new(None)),
        }
    }

    /// Storage at `{app_data_dir}/casedesk/session.db`.
    pub fn open_default() -> Result<Self, StorageError> {
        Ok(Self::open(default_db_path()?))
    }

    /// A private in-memory database, gone when the last clone drops.
    pub fn in_memory() -> Self {
        Self {
            location: Location::Memory,
            pool: Arc::new(Mutex::new(None)),
        }
    }

    /// Open the pool and create the table on first use.
    async fn pool(&self) -> anyhow::Result<SqlitePool> {
        let mut pool_guard = self.pool.lock().await;
        if let Some(pool) = pool_guard.as_ref() {
            return Ok(pool.clone());
        }

        let pool = match &self.location {
            Location::File(path) => {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    std::fs::create_dir_all(parent)
                        .with_context(|| format!("failed to create storage directory at {:?}", parent))?;
                }
                let options = SqliteConnectOptions::new()
                    .filename(path)
                    .create_if_missing(true);
                SqlitePoolOptions::new()
                    .connect_with(options)
                    .await
                    .with_context(|| format!("failed to open session storage at {:?}", path))?
            }
            // A single connection that never recycles, or the database vanishes.
            Location::Memory => SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(SqliteConnectOptions::new().in_memory(true))
                .await
                .context("failed to open in-memory session storage")?,
        };

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS session_store (
                key        TEXT PRIMARY KEY,
                value      TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&pool)
        .await
        .context("failed to create session_store table")?;

        tracing::debug!(location = ?self.location, "session storage initialized");
        *pool_guard = Some(pool.clone());
        Ok(pool)
    }
}

#[async_trait]
impl Storage for SqliteStorage {
    async fn get(&self, key: StorageKey) -> Result<Option<String>, StorageError> {
        let pool = self.pool().await?;
        let row = sqlx::query("SELECT value FROM session_store WHERE key = ?1")
            .bind(key.as_str())
            .fetch_optional(&pool)
            .await
            .with_context(|| format!("failed to read {}", key.as_str()))?;

        match row {
            Some(row) => Ok(Some(
                row.try_get::<String, _>("value")
                    .context("invalid value column")?,
            )),
            None => Ok(None),
        }
    }

    async fn set(&self, key: StorageKey, value: &str) -> Result<(), StorageError> {
        let pool = self.pool().await?;
        sqlx::query(
            r#"
            INSERT INTO session_store (key, value, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(key)
            DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(key.as_str())
        .bind(value)
        .bind(Utc::now().to_rfc3339())
        .execute(&pool)
        .await
        .with_context(|| format!("failed to write {}", key.as_str()))?;
        Ok(())
    }

    async fn remove(&self, key: StorageKey) -> Result<(), StorageError> {
        let pool = self.pool().await?;
        sqlx::query("DELETE FROM session_store WHERE key = ?1")
            .bind(key.as_str())
            .execute(&pool)
            .await
            .with_context(|| format!("failed to remove {}", key.as_str()))?;
        Ok(())
    }
}

fn default_db_path() -> anyhow::Result<PathBuf> {
    let base = dirs::data_dir()
        .or_else(|| {
            dirs::home_dir().map(|mut h| {
                h.push(".local");
                h.push("share");
                h
            })
        })
        .context("failed to resolve OS app data directory - tried data_dir() and home_dir()/.local/share")?;

    Ok(base.join("casedesk").join("session.db"))
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn exercise(storage: &dyn Storage) {
        assert_eq!(storage.get(StorageKey::Token).await.unwrap(), None);

        storage.set(StorageKey::Token, "abc").await.unwrap();
        storage.set(StorageKey::User, r#"{"role":"client"}"#).await.unwrap();
        storage.set(StorageKey::Token, "def").await.unwrap();
        assert_eq!(storage.get(StorageKey::Token).await.unwrap().as_deref(), Some("def"));

        storage.remove(StorageKey::Token).await.unwrap();
        storage.remove(StorageKey::Token).await.unwrap();
        assert_eq!(storage.get(StorageKey::Token).await.unwrap(), None);
        assert_eq!(
            storage.get(StorageKey::User).await.unwrap().as_deref(),
            Some(r#"{"role":"client"}"#)
        );
    }

    #[tokio::test]
    async fn memory_storage_behaves_like_local_storage() {
        let storage = MemoryStorage::new();
        exercise(&storage).await;
        assert_eq!(storage.write_count(), 5);
    }

    #[tokio::test]
    async fn sqlite_storage_behaves_like_local_storage() {
        exercise(&SqliteStorage::in_memory()).await;
    }

    #[tokio::test]
    async fn sqlite_storage_survives_reopen() {
        let dir = std::env::temp_dir().join(format!("casedesk-test-{}", uuid::Uuid::now_v7()));
        let path = dir.join("nested").join("session.db");

        SqliteStorage::open(&path)
            .set(StorageKey::CompanyId, "co-1")
            .await
            .unwrap();

        let reopened = SqliteStorage::open(&path);
        assert_eq!(
            reopened.get(StorageKey::CompanyId).await.unwrap().as_deref(),
            Some("co-1")
        );

        drop(reopened);
        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn keys_match_the_web_client() {
        assert_eq!(StorageKey::Token.as_str(), "token");
        assert_eq!(StorageKey::User.as_str(), "user");
        assert_eq!(StorageKey::CompanyId.as_str(), "companyId");
    }
}
