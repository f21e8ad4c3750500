//! Durable key-value store for string-keyed JSON blobs.
//!
//! Everything the chat core persists goes through this store: the full
//! conversation collection, the session token and user record, and the
//! auxiliary history log. Values are opaque strings to the store; callers
//! serialize and deserialize.

use std::future::Future;
use std::path::Path;
use std::pin::Pin;

use rusqlite::OptionalExtension;
use tokio_rusqlite::Connection;

use crate::chat::core::errors::ChatResult;

/// Boxed future type for store operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Well-known keys of the durable store.
pub mod keys {
    /// The full conversation collection, JSON-serialized.
    pub const CONVERSATIONS: &str = "conversations";
    /// Bearer token of the active session.
    pub const AUTH_TOKEN: &str = "authToken";
    /// Serialized user record of the active session.
    pub const USER: &str = "user";
    /// Auxiliary append-only message log; written and cleared, never read.
    pub const CHAT_HISTORY: &str = "chatHistory";
}

/// Trait for durable string-keyed blob storage.
pub trait DurableStore: Send + Sync {
    /// Read the value stored under `key`, if any.
    fn get(&self, key: &str) -> StoreFuture<'_, ChatResult<Option<String>>>;

    /// Store `value` under `key`, replacing any previous value.
    fn put(&self, key: &str, value: String) -> StoreFuture<'_, ChatResult<()>>;

    /// Remove the value stored under `key`, if any.
    fn remove(&self, key: &str) -> StoreFuture<'_, ChatResult<()>>;
}

/// `SQLite` implementation of the durable store.
pub struct SqliteKvStore {
    conn: Connection,
    table: String,
}

impl SqliteKvStore {
    /// Table name for the key-value blobs.
    pub const DEFAULT_TABLE: &'static str = "kv_blobs";

    /// Open the store at `path` and create the table if it doesn't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or initialized.
    pub async fn open(path: impl AsRef<Path>) -> ChatResult<Self> {
        let conn = Connection::open(path.as_ref()).await?;
        Self::init(conn).await
    }

    /// Open an in-memory store, used by tests.
    ///
    /// # Errors
    /// Returns an error if the database cannot be initialized.
    pub async fn open_in_memory() -> ChatResult<Self> {
        let conn = Connection::open_in_memory().await?;
        Self::init(conn).await
    }

    async fn init(conn: Connection) -> ChatResult<Self> {
        let table = Self::DEFAULT_TABLE.to_string();
        let table_name = table.clone();

        conn.call(move |conn| {
            conn.execute_batch(&format!(
                "CREATE TABLE IF NOT EXISTS {table_name} (
                    key TEXT PRIMARY KEY,
                    value TEXT NOT NULL,
                    updated_at INTEGER NOT NULL
                )"
            ))?;
            Ok(())
        })
        .await?;

        Ok(Self { conn, table })
    }
}

impl DurableStore for SqliteKvStore {
    fn get(&self, key: &str) -> StoreFuture<'_, ChatResult<Option<String>>> {
        let key = key.to_string();
        Box::pin(async move {
            let table = self.table.clone();
            let value = self
                .conn
                .call(move |conn| {
                    let mut stmt =
                        conn.prepare(&format!("SELECT value FROM {table} WHERE key = ?1"))?;
                    let value: Option<String> = stmt
                        .query_row(rusqlite::params![key], |row| row.get(0))
                        .optional()?;
                    Ok(value)
                })
                .await?;
            Ok(value)
        })
    }

    fn put(&self, key: &str, value: String) -> StoreFuture<'_, ChatResult<()>> {
        let key = key.to_string();
        Box::pin(async move {
            let table = self.table.clone();
            let now_ms = chrono::Utc::now().timestamp_millis();
            self.conn
                .call(move |conn| {
                    conn.execute(
                        &format!(
                            "INSERT OR REPLACE INTO {table} (key, value, updated_at)
                             VALUES (?1, ?2, ?3)"
                        ),
                        rusqlite::params![key, value, now_ms],
                    )?;
                    Ok(())
                })
                .await?;
            Ok(())
        })
    }

    fn remove(&self, key: &str) -> StoreFuture<'_, ChatResult<()>> {
        let key = key.to_string();
        Box::pin(async move {
            let table = self.table.clone();
            self.conn
                .call(move |conn| {
                    conn.execute(
                        &format!("DELETE FROM {table} WHERE key = ?1"),
                        rusqlite::params![key],
                    )?;
                    Ok(())
                })
                .await?;
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn get_of_missing_key_is_none() {
        let store = SqliteKvStore::open_in_memory().await.unwrap();
        assert_eq!(store.get("nope").await.unwrap(), None);
    }

    #[tokio::test]
    async fn put_then_get_roundtrips() {
        let store = SqliteKvStore::open_in_memory().await.unwrap();
        store
            .put(keys::AUTH_TOKEN, "tok-123".to_string())
            .await
            .unwrap();
        assert_eq!(
            store.get(keys::AUTH_TOKEN).await.unwrap(),
            Some("tok-123".to_string())
        );
    }

    #[tokio::test]
    async fn put_replaces_previous_value() {
        let store = SqliteKvStore::open_in_memory().await.unwrap();
        store.put("k", "first".to_string()).await.unwrap();
        store.put("k", "second".to_string()).await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some("second".to_string()));
    }

    #[tokio::test]
    async fn remove_deletes_the_key() {
        let store = SqliteKvStore::open_in_memory().await.unwrap();
        store.put("k", "v".to_string()).await.unwrap();
        store.remove("k").await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn remove_of_missing_key_is_ok() {
        let store = SqliteKvStore::open_in_memory().await.unwrap();
        assert!(store.remove("missing").await.is_ok());
    }
}
