//! In-memory conversation collection with durable write-through.
//!
//! The collection is ordered most-recently-created first. The current
//! selection is stored as an id into the collection, never as a second copy
//! of the conversation, so renames and message updates cannot diverge from
//! what the selection points at.
//!
//! Every mutation funnels through one persistence choke point that rewrites
//! the whole collection under the `conversations` key before the operation
//! returns; after any settled mutation the durable store and the in-memory
//! collection are equal.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::chat::core::conversation::{Conversation, Message};
use crate::chat::core::errors::{ChatError, ChatResult};
use crate::chat::core::ids::ConversationId;
use crate::chat::storage::kv::{DurableStore, keys};

#[derive(Default)]
struct Inner {
    conversations: Vec<Conversation>,
    current: Option<ConversationId>,
}

/// Owner of the conversation collection and the current selection.
pub struct ConversationStore {
    durable: Arc<dyn DurableStore>,
    inner: RwLock<Inner>,
}

impl ConversationStore {
    /// Create an empty store over the given durable backend.
    #[must_use]
    pub fn new(durable: Arc<dyn DurableStore>) -> Self {
        Self {
            durable,
            inner: RwLock::new(Inner::default()),
        }
    }

    /// Load the persisted collection and select its first conversation.
    ///
    /// A corrupt blob is discarded (and removed durably) rather than
    /// poisoning startup.
    ///
    /// # Errors
    /// Returns an error if the durable store fails.
    pub async fn hydrate(&self) -> ChatResult<()> {
        let Some(json) = self.durable.get(keys::CONVERSATIONS).await? else {
            return Ok(());
        };

        let conversations: Vec<Conversation> = match serde_json::from_str(&json) {
            Ok(parsed) => parsed,
            Err(err) => {
                warn!(?err, "Discarding corrupt conversation blob");
                self.durable.remove(keys::CONVERSATIONS).await?;
                return Ok(());
            }
        };

        let mut inner = self.inner.write().await;
        inner.current = conversations.first().map(|c| c.id);
        inner.conversations = conversations;
        debug!(count = inner.conversations.len(), "Hydrated conversations");
        Ok(())
    }

    /// Create a new empty conversation, insert it at the head of the
    /// collection and select it.
    ///
    /// # Errors
    /// Returns an error if the write-through fails.
    pub async fn create(&self) -> ChatResult<Conversation> {
        let conversation = Conversation::new();
        let snapshot = {
            let mut inner = self.inner.write().await;
            inner.conversations.insert(0, conversation.clone());
            inner.current = Some(conversation.id);
            inner.conversations.clone()
        };
        self.persist(&snapshot).await?;
        info!(id = %conversation.id, "Created conversation");
        Ok(conversation)
    }

    /// Select the conversation with the given id. Returns the selected
    /// conversation, or `None` (selection unchanged) if it is absent.
    pub async fn select(&self, id: ConversationId) -> Option<Conversation> {
        let mut inner = self.inner.write().await;
        let found = inner.conversations.iter().find(|c| c.id == id).cloned();
        if found.is_some() {
            inner.current = Some(id);
        }
        found
    }

    /// Delete the conversation with the given id.
    ///
    /// If the deleted conversation was current, the first conversation of
    /// the post-deletion collection becomes current, or none if the
    /// collection is now empty.
    ///
    /// # Errors
    /// Returns an error if the write-through fails.
    pub async fn delete(&self, id: ConversationId) -> ChatResult<()> {
        let snapshot = {
            let mut inner = self.inner.write().await;
            inner.conversations.retain(|c| c.id != id);
            if inner.current == Some(id) {
                inner.current = inner.conversations.first().map(|c| c.id);
            }
            inner.conversations.clone()
        };
        self.persist(&snapshot).await?;
        info!(id = %id, "Deleted conversation");
        Ok(())
    }

    /// Rename the conversation with the given id. The title is stored
    /// trimmed; an empty trimmed title is rejected.
    ///
    /// # Errors
    /// Returns [`ChatError::InvalidInput`] for an empty title, or a storage
    /// error if the write-through fails.
    pub async fn rename(&self, id: ConversationId, new_title: &str) -> ChatResult<()> {
        let title = new_title.trim();
        if title.is_empty() {
            return Err(ChatError::InvalidInput(
                "conversation title must not be empty".to_string(),
            ));
        }

        let snapshot = {
            let mut inner = self.inner.write().await;
            if let Some(conversation) = inner.conversations.iter_mut().find(|c| c.id == id) {
                conversation.title = title.to_string();
            }
            inner.conversations.clone()
        };
        self.persist(&snapshot).await?;
        debug!(id = %id, title, "Renamed conversation");
        Ok(())
    }

    /// Atomically replace the message sequence of a conversation. Used for
    /// both appending (build the new sequence, replace) and clearing.
    ///
    /// # Errors
    /// Returns an error if the write-through fails.
    pub async fn replace_messages(
        &self,
        id: ConversationId,
        messages: Vec<Message>,
    ) -> ChatResult<()> {
        let snapshot = {
            let mut inner = self.inner.write().await;
            if let Some(conversation) = inner.conversations.iter_mut().find(|c| c.id == id) {
                conversation.messages = messages;
            }
            inner.conversations.clone()
        };
        self.persist(&snapshot).await
    }

    /// Empty the collection, clear the selection and remove the persisted
    /// collection and history blobs.
    ///
    /// # Errors
    /// Returns an error if the durable store fails.
    pub async fn clear_all(&self) -> ChatResult<()> {
        {
            let mut inner = self.inner.write().await;
            inner.conversations.clear();
            inner.current = None;
        }
        self.durable.remove(keys::CONVERSATIONS).await?;
        self.durable.remove(keys::CHAT_HISTORY).await?;
        info!("Cleared all conversations");
        Ok(())
    }

    /// Conversations whose title contains `term`, case-insensitively, in
    /// collection order. An empty term yields the full collection. Pure:
    /// never mutates state.
    pub async fn search(&self, term: &str) -> Vec<Conversation> {
        let inner = self.inner.read().await;
        inner
            .conversations
            .iter()
            .filter(|c| c.title_matches(term))
            .cloned()
            .collect()
    }

    /// Snapshot of the current conversation, if one is selected.
    pub async fn current(&self) -> Option<Conversation> {
        let inner = self.inner.read().await;
        let id = inner.current?;
        inner.conversations.iter().find(|c| c.id == id).cloned()
    }

    /// Snapshot of the conversation with the given id, if present.
    pub async fn get(&self, id: ConversationId) -> Option<Conversation> {
        let inner = self.inner.read().await;
        inner.conversations.iter().find(|c| c.id == id).cloned()
    }

    /// Snapshot of the full collection in order.
    pub async fn list(&self) -> Vec<Conversation> {
        self.inner.read().await.conversations.clone()
    }

    /// Number of conversations in the collection.
    pub async fn count(&self) -> usize {
        self.inner.read().await.conversations.len()
    }

    /// Write-through choke point: every mutation rewrites the whole
    /// collection here before returning.
    async fn persist(&self, snapshot: &[Conversation]) -> ChatResult<()> {
        let json = serde_json::to_string(snapshot)?;
        self.durable.put(keys::CONVERSATIONS, json).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::storage::kv::SqliteKvStore;

    async fn store() -> ConversationStore {
        let durable: Arc<dyn DurableStore> =
            Arc::new(SqliteKvStore::open_in_memory().await.unwrap());
        ConversationStore::new(durable)
    }

    /// The durable collection must equal the in-memory one after a settled
    /// mutation.
    async fn assert_write_through(store: &ConversationStore) {
        let json = store
            .durable
            .get(keys::CONVERSATIONS)
            .await
            .unwrap()
            .unwrap_or_else(|| "[]".to_string());
        let persisted: Vec<Conversation> = serde_json::from_str(&json).unwrap();
        assert_eq!(persisted, store.list().await);
    }

    #[tokio::test]
    async fn create_prepends_and_selects() {
        let store = store().await;
        let first = store.create().await.unwrap();
        let second = store.create().await.unwrap();

        let list = store.list().await;
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].id, second.id);
        assert_eq!(list[1].id, first.id);
        assert_eq!(store.current().await.unwrap().id, second.id);
        assert_write_through(&store).await;
    }

    #[tokio::test]
    async fn select_switches_current_and_ignores_unknown_ids() {
        let store = store().await;
        let first = store.create().await.unwrap();
        let _second = store.create().await.unwrap();

        assert!(store.select(first.id).await.is_some());
        assert_eq!(store.current().await.unwrap().id, first.id);

        assert!(store.select(ConversationId::new()).await.is_none());
        assert_eq!(store.current().await.unwrap().id, first.id);
    }

    #[tokio::test]
    async fn delete_current_selects_new_head() {
        let store = store().await;
        let oldest = store.create().await.unwrap();
        let middle = store.create().await.unwrap();
        let newest = store.create().await.unwrap();

        // Order is [newest, middle, oldest]; newest is current.
        store.delete(newest.id).await.unwrap();
        assert_eq!(store.current().await.unwrap().id, middle.id);

        store.delete(middle.id).await.unwrap();
        assert_eq!(store.current().await.unwrap().id, oldest.id);

        store.delete(oldest.id).await.unwrap();
        assert!(store.current().await.is_none());
        assert_write_through(&store).await;
    }

    #[tokio::test]
    async fn delete_of_non_current_keeps_selection() {
        let store = store().await;
        let first = store.create().await.unwrap();
        let second = store.create().await.unwrap();

        store.delete(first.id).await.unwrap();
        assert_eq!(store.current().await.unwrap().id, second.id);
        assert_eq!(store.count().await, 1);
    }

    #[tokio::test]
    async fn rename_updates_collection_and_current_view() {
        let store = store().await;
        let conversation = store.create().await.unwrap();
        store.rename(conversation.id, "  Project notes  ").await.unwrap();

        assert_eq!(store.current().await.unwrap().title, "Project notes");
        assert_eq!(store.list().await[0].title, "Project notes");
        assert_write_through(&store).await;
    }

    #[tokio::test]
    async fn rename_rejects_empty_titles() {
        let store = store().await;
        let conversation = store.create().await.unwrap();
        assert!(matches!(
            store.rename(conversation.id, "   ").await,
            Err(ChatError::InvalidInput(_))
        ));
        assert_eq!(store.current().await.unwrap().title, "Conversation");
    }

    #[tokio::test]
    async fn replace_messages_is_visible_through_current() {
        let store = store().await;
        let conversation = store.create().await.unwrap();
        let messages = vec![Message::user("hello")];
        store
            .replace_messages(conversation.id, messages.clone())
            .await
            .unwrap();

        assert_eq!(store.current().await.unwrap().messages, messages);
        assert_write_through(&store).await;
    }

    #[tokio::test]
    async fn search_filters_by_title_case_insensitively() {
        let store = store().await;
        let kept = store.create().await.unwrap();
        store.rename(kept.id, "Rust help").await.unwrap();
        let other = store.create().await.unwrap();
        store.rename(other.id, "Groceries").await.unwrap();

        let hits = store.search("rust").await;
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, kept.id);

        // Pure and idempotent.
        assert_eq!(store.search("rust").await, hits);
        assert_eq!(store.count().await, 2);
    }

    #[tokio::test]
    async fn search_with_empty_term_returns_all_in_order() {
        let store = store().await;
        store.create().await.unwrap();
        store.create().await.unwrap();

        let all = store.search("").await;
        assert_eq!(all, store.list().await);
    }

    #[tokio::test]
    async fn clear_all_then_create_leaves_exactly_one() {
        let store = store().await;
        store.create().await.unwrap();
        store.create().await.unwrap();

        store.clear_all().await.unwrap();
        assert_eq!(store.count().await, 0);
        assert!(store.current().await.is_none());
        assert_eq!(store.durable.get(keys::CONVERSATIONS).await.unwrap(), None);
        assert_eq!(store.durable.get(keys::CHAT_HISTORY).await.unwrap(), None);

        let fresh = store.create().await.unwrap();
        let list = store.list().await;
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].id, fresh.id);
    }

    #[tokio::test]
    async fn hydrate_restores_collection_and_selects_head() {
        let durable: Arc<dyn DurableStore> =
            Arc::new(SqliteKvStore::open_in_memory().await.unwrap());

        let first = ConversationStore::new(Arc::clone(&durable));
        let head = first.create().await.unwrap();
        first.rename(head.id, "Persisted").await.unwrap();

        let second = ConversationStore::new(durable);
        second.hydrate().await.unwrap();
        assert_eq!(second.count().await, 1);
        assert_eq!(second.current().await.unwrap().title, "Persisted");
    }

    #[tokio::test]
    async fn hydrate_discards_corrupt_blob() {
        let durable: Arc<dyn DurableStore> =
            Arc::new(SqliteKvStore::open_in_memory().await.unwrap());
        durable
            .put(keys::CONVERSATIONS, "][ nope".to_string())
            .await
            .unwrap();

        let store = ConversationStore::new(Arc::clone(&durable));
        store.hydrate().await.unwrap();
        assert_eq!(store.count().await, 0);
        assert_eq!(durable.get(keys::CONVERSATIONS).await.unwrap(), None);
    }
}
