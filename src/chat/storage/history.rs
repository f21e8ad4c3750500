//! Auxiliary append-only message log.
//!
//! Every settled message is appended here under the `chatHistory` key. The
//! core never reads the log back; it exists for external inspection and is
//! cleared together with the conversation collection. Log failures are
//! reported but must not fail the operation that produced the message.

use std::sync::Arc;

use tracing::debug;

use crate::chat::core::conversation::Message;
use crate::chat::core::errors::ChatResult;
use crate::chat::storage::kv::{DurableStore, keys};

/// Append-only message log on top of the durable store.
pub struct HistoryLog {
    durable: Arc<dyn DurableStore>,
}

impl HistoryLog {
    /// Create a log over the given durable store.
    #[must_use]
    pub fn new(durable: Arc<dyn DurableStore>) -> Self {
        Self { durable }
    }

    /// Append a message to the log.
    ///
    /// # Errors
    /// Returns an error if the log cannot be read or written.
    pub async fn append(&self, message: &Message) -> ChatResult<()> {
        let mut entries: Vec<Message> = match self.durable.get(keys::CHAT_HISTORY).await? {
            Some(json) => serde_json::from_str(&json).unwrap_or_default(),
            None => Vec::new(),
        };
        entries.push(message.clone());
        let json = serde_json::to_string(&entries)?;
        self.durable.put(keys::CHAT_HISTORY, json).await?;
        debug!(total = entries.len(), "Appended message to history log");
        Ok(())
    }

    /// Remove the whole log.
    ///
    /// # Errors
    /// Returns an error if the durable store fails.
    pub async fn clear(&self) -> ChatResult<()> {
        self.durable.remove(keys::CHAT_HISTORY).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::storage::kv::SqliteKvStore;

    async fn log_with_store() -> (HistoryLog, Arc<dyn DurableStore>) {
        let store: Arc<dyn DurableStore> =
            Arc::new(SqliteKvStore::open_in_memory().await.unwrap());
        (HistoryLog::new(Arc::clone(&store)), store)
    }

    #[tokio::test]
    async fn append_accumulates_entries() {
        let (log, store) = log_with_store().await;
        log.append(&Message::user("one")).await.unwrap();
        log.append(&Message::user("two")).await.unwrap();

        let json = store.get(keys::CHAT_HISTORY).await.unwrap().unwrap();
        let entries: Vec<Message> = serde_json::from_str(&json).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].text, "one");
        assert_eq!(entries[1].text, "two");
    }

    #[tokio::test]
    async fn clear_removes_the_key() {
        let (log, store) = log_with_store().await;
        log.append(&Message::user("one")).await.unwrap();
        log.clear().await.unwrap();
        assert_eq!(store.get(keys::CHAT_HISTORY).await.unwrap(), None);
    }

    #[tokio::test]
    async fn corrupt_log_is_replaced_not_fatal() {
        let (log, store) = log_with_store().await;
        store
            .put(keys::CHAT_HISTORY, "{not json".to_string())
            .await
            .unwrap();
        log.append(&Message::user("fresh")).await.unwrap();

        let json = store.get(keys::CHAT_HISTORY).await.unwrap().unwrap();
        let entries: Vec<Message> = serde_json::from_str(&json).unwrap();
        assert_eq!(entries.len(), 1);
    }
}
