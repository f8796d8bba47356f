// ABOUTME: Key-value store abstraction with SQLite and in-memory backends
// ABOUTME: UserStore maps usernames to store keys and serializes per-key writes

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use serde_json::Value;
use sqlx::{Row, sqlite::SqlitePool};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use crate::error;
use crate::types::User;

/// The shared key-value backend. Keys are plain strings, values are opaque
/// JSON records; absent keys are `None`, not an error. `set` is an
/// unconditional full overwrite.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Value>>;
    async fn set(&self, key: &str, value: Value) -> Result<()>;
}

pub struct SqliteStore {
    pub pool: SqlitePool,
}

impl SqliteStore {
    pub async fn new(database_url: &str) -> Result<Self> {
        // Create database file if it doesn't exist
        let pool = SqlitePool::connect(database_url).await?;

        let store = Self { pool };
        store.initialize_schema().await?;

        Ok(store)
    }

    async fn initialize_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for SqliteStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        let row = sqlx::query("SELECT value FROM kv WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let raw: String = row.get("value");
                let value = serde_json::from_str(&raw)
                    .with_context(|| format!("Corrupt record at key '{}'", key))?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: Value) -> Result<()> {
        let raw = serde_json::to_string(&value)?;

        sqlx::query(
            "INSERT INTO kv (key, value) VALUES (?, ?) \
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        )
        .bind(key)
        .bind(raw)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

/// In-memory backend used by tests and embedded setups.
#[derive(Default)]
#[allow(dead_code)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, Value>>,
}

impl MemoryStore {
    #[allow(dead_code)]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        let entries = self
            .entries
            .read()
            .map_err(|_| anyhow!("Store lock poisoned"))?;
        Ok(entries.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| anyhow!("Store lock poisoned"))?;
        entries.insert(key.to_string(), value);
        Ok(())
    }
}

/// Typed access to User records in the key-value backend. The store itself
/// enforces no schema; parsing happens here.
pub struct UserStore {
    kv: Arc<dyn KeyValueStore>,
    write_locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

pub fn user_key(username: &str) -> String {
    format!("user:{}", username.to_lowercase())
}

impl UserStore {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self {
            kv,
            write_locks: Mutex::new(HashMap::new()),
        }
    }

    pub async fn get(&self, username: &str) -> error::Result<Option<User>> {
        let value = self.kv.get(&user_key(username)).await?;

        match value {
            Some(value) => {
                let user = serde_json::from_value(value).map_err(|e| {
                    error::AppError::Store(anyhow!(
                        "Corrupt user record for '{}': {}",
                        username,
                        e
                    ))
                })?;
                Ok(Some(user))
            }
            None => Ok(None),
        }
    }

    pub async fn put(&self, username: &str, user: &User) -> error::Result<()> {
        let value = serde_json::to_value(user)
            .map_err(|e| error::AppError::Store(anyhow!("Failed to encode user record: {}", e)))?;
        self.kv.set(&user_key(username), value).await?;
        Ok(())
    }

    /// Per-username write lock. The backend offers no compare-and-swap, so
    /// every read-modify-write holds this lock across its get+put pair to
    /// keep concurrent appends and registrations from overwriting each other.
    pub fn write_lock(&self, username: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.write_locks.lock().unwrap_or_else(|e| e.into_inner());
        locks
            .entry(user_key(username))
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    }
}
