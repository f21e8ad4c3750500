//! Chat subsystem for the Palaver client core.
//!
//! Organized into:
//! - `core`: Configuration, errors, IDs, conversation and session types
//! - `storage`: Durable key-value store (SQLite) and the auxiliary history log
//! - `remote`: Wire types and the authenticated remote chat API client
//! - `conversations`: In-memory conversation collection with write-through
//! - `session`: Session gate holding the authenticated user
//! - `engine`: Orchestration of sends, clears, login/logout and notices

pub mod conversations;
pub mod core;
pub mod engine;
pub mod remote;
pub mod session;
pub mod storage;

/// Initialize tracing with a basic subscriber.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_env_filter("info").try_init();
}

// Re-export commonly used types for convenience
pub use conversations::ConversationStore;
pub use self::core::{
    ApiConfig, ChatConfig, ChatError, ChatResult, Conversation, ConversationId, Message,
    MessageId, Session, SessionConfig, StorageConfig, User,
};
pub use engine::{ChatBackends, ChatEngine, ClearOutcome, LoginOutcome, Notice, NoticeKind,
    SendOutcome};
pub use remote::{ChatApi, ChatReply, HistoryEntry, HttpChatApi};
pub use session::SessionGate;
pub use storage::{DurableStore, HistoryLog, SqliteKvStore, StoreFuture, keys};
