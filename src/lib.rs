//! Palaver: conversation state and synchronization core for a chat client.
//!
//! This crate owns the data model and the state machine behind a chat UI:
//! conversations and their messages, the durable write-through persistence of
//! both, the authenticated session, and the optimistic-update/rollback
//! protocol around sending a message to a remote inference endpoint.
//!
//! Rendering is out of scope. An embedding UI holds a [`chat::ChatEngine`]
//! (typically behind an `Arc`), drives it from its event handlers, and reads
//! conversation and notice state back for display.

#![forbid(unsafe_code)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

/// Chat subsystem: conversation state, persistence, remote sync.
pub mod chat;

pub use chat::{ChatConfig, ChatEngine, ChatError, ChatResult, init_tracing};
