//! Whole-document key-value stores.
//!
//! Values are opaque strings (JSON documents in practice). There is no
//! locking across a read-modify-write: callers assume a single writer.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use libsql::{Connection, Database, params};

use sanstha_shared::{Result, SansthaError};

use crate::migrations;

/// Persistent string store keyed by name.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read a value. `Ok(None)` when the key was never written.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Replace the value stored under `key`.
    async fn put(&self, key: &str, value: &str) -> Result<()>;
}

// ---------------------------------------------------------------------------
// libSQL
// ---------------------------------------------------------------------------

/// Key-value store backed by a local libSQL database file.
pub struct LibsqlStore {
    #[allow(dead_code)]
    db: Database,
    conn: Connection,
}

impl LibsqlStore {
    /// Open or create a database at `path` and apply pending migrations.
    pub async fn open(path: &Path) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| SansthaError::io(parent, e))?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| SansthaError::Storage(e.to_string()))?;

        let conn = db
            .connect()
            .map_err(|e| SansthaError::Storage(e.to_string()))?;

        let store = Self { db, conn };
        store.run_migrations().await?;
        Ok(store)
    }

    /// Run pending schema migrations.
    async fn run_migrations(&self) -> Result<()> {
        let current_version = self.schema_version().await;

        for migration in migrations::all_migrations() {
            if migration.version > current_version {
                tracing::info!(
                    version = migration.version,
                    description = migration.description,
                    "applying migration"
                );
                self.conn.execute_batch(migration.sql).await.map_err(|e| {
                    SansthaError::Storage(format!("migration v{} failed: {e}", migration.version))
                })?;
            }
        }
        Ok(())
    }

    /// Current schema version, or 0 if no migrations have been applied.
    async fn schema_version(&self) -> u32 {
        let result = self
            .conn
            .query("SELECT MAX(version) FROM schema_migrations", params![])
            .await;

        match result {
            Ok(mut rows) => match rows.next().await {
                Ok(Some(row)) => row.get::<u32>(0).unwrap_or(0),
                _ => 0,
            },
            Err(_) => 0, // Table doesn't exist yet
        }
    }
}

#[async_trait]
impl KeyValueStore for LibsqlStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut rows = self
            .conn
            .query("SELECT value FROM kv WHERE key = ?1", params![key])
            .await
            .map_err(|e| SansthaError::Storage(e.to_string()))?;

        match rows.next().await {
            Ok(Some(row)) => {
                let value: String = row
                    .get(0)
                    .map_err(|e| SansthaError::Storage(e.to_string()))?;
                Ok(Some(value))
            }
            Ok(None) => Ok(None),
            Err(e) => Err(SansthaError::Storage(e.to_string())),
        }
    }

    async fn put(&self, key: &str, value: &str) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        self.conn
            .execute(
                "INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(key) DO UPDATE SET
                   value = excluded.value,
                   updated_at = excluded.updated_at",
                params![key, value, now.as_str()],
            )
            .await
            .map_err(|e| SansthaError::Storage(e.to_string()))?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// In-memory
// ---------------------------------------------------------------------------

/// Process-local store, used by tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| SansthaError::Storage("memory store poisoned".into()))?;
        Ok(entries.get(key).cloned())
    }

    async fn put(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| SansthaError::Storage("memory store poisoned".into()))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn temp_db() -> std::path::PathBuf {
        std::env::temp_dir().join(format!("sanstha_test_{}.db", Uuid::now_v7()))
    }

    #[tokio::test]
    async fn open_and_migrate() {
        let store = LibsqlStore::open(&temp_db()).await.expect("open test db");
        assert_eq!(store.schema_version().await, 1);
    }

    #[tokio::test]
    async fn idempotent_migration() {
        let tmp = temp_db();
        let s1 = LibsqlStore::open(&tmp).await.expect("first open");
        s1.put("k", "v1").await.unwrap();
        drop(s1);

        let s2 = LibsqlStore::open(&tmp).await.expect("second open");
        assert_eq!(s2.schema_version().await, 1);
        assert_eq!(s2.get("k").await.unwrap().as_deref(), Some("v1"));
    }

    #[tokio::test]
    async fn libsql_put_overwrites() {
        let store = LibsqlStore::open(&temp_db()).await.unwrap();
        assert!(store.get("blogFeeds").await.unwrap().is_none());

        store.put("blogFeeds", "[]").await.unwrap();
        store.put("blogFeeds", r#"["https://a.example/feed"]"#).await.unwrap();
        assert_eq!(
            store.get("blogFeeds").await.unwrap().as_deref(),
            Some(r#"["https://a.example/feed"]"#)
        );
    }

    #[tokio::test]
    async fn memory_store_roundtrip() {
        let store = MemoryStore::new();
        assert!(store.get("k").await.unwrap().is_none());
        store.put("k", "v").await.unwrap();
        store.put("k", "w").await.unwrap();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("w"));
    }
}
