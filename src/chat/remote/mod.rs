//! Remote chat API: wire types and the authenticated HTTP client.

pub mod client;
pub mod types;

pub use client::{ApiFuture, ChatApi, HttpChatApi};
pub use types::{ChatReply, HistoryEntry};
