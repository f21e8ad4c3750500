//! Core chat types and identifiers.

pub mod config;
pub mod conversation;
pub mod errors;
pub mod ids;
pub mod user;

pub use config::{ApiConfig, ChatConfig, SessionConfig, StorageConfig};
pub use conversation::{Conversation, Message};
pub use errors::{ChatError, ChatResult};
pub use ids::{ConversationId, MessageId};
pub use user::{Session, User};
