//! Conversation and message model.

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};

use crate::chat::core::ids::{ConversationId, MessageId};

/// Default title of a freshly created conversation.
pub const DEFAULT_TITLE: &str = "Conversation";

/// A single chat message. Immutable after creation; a message only ever
/// leaves a conversation as the rollback of a failed send.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Unique identifier, generated client-side or taken from the server.
    pub id: MessageId,
    /// Message body.
    pub text: String,
    /// Whether the message was written by the user (vs. the assistant).
    pub from_user: bool,
    /// Creation time, serialized as an ISO-8601 timestamp.
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// Build a user message stamped with the current time.
    #[must_use]
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            id: MessageId::new(),
            text: text.into(),
            from_user: true,
            timestamp: Utc::now(),
        }
    }

    /// Build an assistant message.
    #[must_use]
    pub fn assistant(
        id: MessageId,
        text: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            text: text.into(),
            from_user: false,
            timestamp,
        }
    }
}

/// A conversation: an append-ordered message sequence with display metadata.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    /// Unique identifier within the collection.
    pub id: ConversationId,
    /// Display title; mutable through rename.
    pub title: String,
    /// Human-readable creation date (e.g. "Aug 5, 2026"); immutable.
    pub created_on: String,
    /// Messages in append order.
    pub messages: Vec<Message>,
}

impl Conversation {
    /// Create an empty conversation with the default title, stamped with
    /// today's date.
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: ConversationId::new(),
            title: DEFAULT_TITLE.to_string(),
            created_on: Local::now().format("%b %-d, %Y").to_string(),
            messages: Vec::new(),
        }
    }

    /// Case-insensitive substring match on the title, used by search.
    #[must_use]
    pub fn title_matches(&self, term: &str) -> bool {
        self.title.to_lowercase().contains(&term.to_lowercase())
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}
