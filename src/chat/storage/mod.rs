//! Durable storage for chat data.

pub mod history;
pub mod kv;

pub use history::HistoryLog;
pub use kv::{DurableStore, SqliteKvStore, StoreFuture, keys};
