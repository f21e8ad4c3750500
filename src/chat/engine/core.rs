//! Chat engine orchestration.
//!
//! The engine wires the conversation store, the session gate and the remote
//! API together and owns the two pieces of state that belong to neither:
//! the single user-visible error notice and the one-in-flight send flag.
//!
//! Network-facing operations never surface raw errors to the embedder.
//! Every failure path ends in either a rollback plus a notice, or a
//! best-effort no-op; outcome enums report what happened.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::chat::conversations::ConversationStore;
use crate::chat::core::config::ChatConfig;
use crate::chat::core::conversation::Message;
use crate::chat::core::errors::{ChatError, ChatResult};
use crate::chat::core::ids::ConversationId;
use crate::chat::core::user::User;
use crate::chat::remote::client::{ChatApi, HttpChatApi};
use crate::chat::remote::types::HistoryEntry;
use crate::chat::session::SessionGate;
use crate::chat::storage::history::HistoryLog;
use crate::chat::storage::kv::{DurableStore, SqliteKvStore};

/// Notice shown when the session expired or the token was rejected.
const SESSION_EXPIRED: &str = "Session expired. Please login again.";
/// Notice shown when a send failed for non-auth reasons.
const SEND_FAILED: &str =
    "Sorry, something went wrong while sending your message. Please try again.";
/// Login failure message used when the transport failed.
const LOGIN_NETWORK_FAILED: &str = "Network error. Please try again.";

/// Kind of a user-visible notice.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum NoticeKind {
    /// The session expired; a forced logout is scheduled.
    SessionExpired,
    /// A send or clear failed and was rolled back.
    OperationFailed,
}

/// A user-visible error notice. At most one exists at a time; it is
/// replaced by later failures and cleared by the next successful operation.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Notice {
    /// Classification of the notice.
    pub kind: NoticeKind,
    /// Display message.
    pub message: String,
}

/// Outcome of a send attempt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SendOutcome {
    /// The user message and the assistant reply were both appended.
    Delivered(Message),
    /// The text was blank after trimming; nothing happened.
    Ignored,
    /// A send is already in flight; the attempt was refused, not queued.
    Busy,
    /// The send failed; the optimistic message was rolled back.
    Failed(Notice),
}

/// Outcome of a clear-chat attempt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClearOutcome {
    /// Local messages were cleared (the remote clear may have failed
    /// non-fatally).
    Cleared,
    /// No conversation is current; nothing happened.
    Ignored,
    /// The token was rejected; messages were kept and a forced logout is
    /// scheduled.
    Failed(Notice),
}

/// Outcome of a login attempt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoginOutcome {
    /// The session is installed and persisted.
    LoggedIn(User),
    /// The server or the transport declined; the message is displayable.
    Rejected(String),
}

/// Backend dependencies for the chat engine.
pub struct ChatBackends {
    /// Durable key-value store.
    pub durable: Arc<dyn DurableStore>,
    /// Remote chat API client.
    pub api: Arc<dyn ChatApi>,
}

impl ChatBackends {
    /// Build the default backends from config: a `SQLite` store and the
    /// HTTP API client.
    ///
    /// # Errors
    /// Returns an error if either backend cannot be initialized.
    pub async fn sqlite_http(config: &ChatConfig) -> ChatResult<Self> {
        let durable: Arc<dyn DurableStore> =
            Arc::new(SqliteKvStore::open(&config.storage.sqlite_path).await?);
        let api: Arc<dyn ChatApi> = Arc::new(HttpChatApi::new(&config.api)?);
        Ok(Self { durable, api })
    }
}

/// Chat engine: the facade an embedding UI drives.
///
/// Cheap to clone; clones share all state. The forced-logout timer holds a
/// clone, so the engine keeps working even if the embedder drops its own
/// handle early.
#[derive(Clone)]
pub struct ChatEngine {
    config: ChatConfig,
    api: Arc<dyn ChatApi>,
    conversations: Arc<ConversationStore>,
    session: Arc<SessionGate>,
    history: Arc<HistoryLog>,
    notice: Arc<RwLock<Option<Notice>>>,
    sending: Arc<AtomicBool>,
}

impl ChatEngine {
    /// Create a new chat engine.
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid.
    pub fn new(config: ChatConfig, backends: ChatBackends) -> ChatResult<Self> {
        config.validate()?;
        let conversations = Arc::new(ConversationStore::new(Arc::clone(&backends.durable)));
        let session = Arc::new(SessionGate::new(Arc::clone(&backends.durable)));
        let history = Arc::new(HistoryLog::new(backends.durable));

        Ok(Self {
            config,
            api: backends.api,
            conversations,
            session,
            history,
            notice: Arc::new(RwLock::new(None)),
            sending: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Create a new engine using the default `SQLite` + HTTP backends.
    ///
    /// # Errors
    /// Returns an error if backends cannot be initialized.
    pub async fn from_config(config: ChatConfig) -> ChatResult<Self> {
        let backends = ChatBackends::sqlite_http(&config).await?;
        Self::new(config, backends)
    }

    /// Restore session and conversations from durable storage. Call once
    /// at startup.
    ///
    /// # Errors
    /// Returns an error if the durable store fails.
    pub async fn hydrate(&self) -> ChatResult<()> {
        self.session.hydrate().await?;
        self.conversations.hydrate().await
    }

    /// The conversation collection. All conversation CRUD goes through
    /// this store.
    #[must_use]
    pub fn conversations(&self) -> &ConversationStore {
        &self.conversations
    }

    /// The session gate.
    #[must_use]
    pub fn session(&self) -> &SessionGate {
        &self.session
    }

    /// Whether a send is currently in flight. The embedder disables its
    /// send trigger while this is true.
    #[must_use]
    pub fn is_sending(&self) -> bool {
        self.sending.load(Ordering::SeqCst)
    }

    /// The current user-visible notice, if any.
    pub async fn notice(&self) -> Option<Notice> {
        self.notice.read().await.clone()
    }

    /// Explicitly dismiss the current notice (e.g. on retry).
    pub async fn clear_notice(&self) {
        *self.notice.write().await = None;
    }

    /// Send a user message to the current conversation, creating one if
    /// none is selected.
    ///
    /// The user message is appended (and persisted) before the network
    /// call; on failure it is filtered back out of the conversation so no
    /// partial state survives.
    pub async fn send_message(&self, text: &str) -> SendOutcome {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return SendOutcome::Ignored;
        }

        if self
            .sending
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("Send refused: another send is in flight");
            return SendOutcome::Busy;
        }

        let outcome = self.send_inner(trimmed).await;
        self.sending.store(false, Ordering::SeqCst);
        outcome
    }

    async fn send_inner(&self, text: &str) -> SendOutcome {
        // Auto-provision a conversation before the optimistic append.
        let conversation = match self.conversations.current().await {
            Some(conversation) => conversation,
            None => match self.conversations.create().await {
                Ok(conversation) => conversation,
                Err(err) => return self.fail_send(err).await,
            },
        };

        let user_message = Message::user(text);
        let mut messages = conversation.messages.clone();
        messages.push(user_message.clone());
        if let Err(err) = self
            .conversations
            .replace_messages(conversation.id, messages)
            .await
        {
            return self.fail_send(err).await;
        }

        let result = match self.session.token().await {
            Some(token) => self.api.send_message(&token, text).await,
            None => Err(ChatError::AuthRequired),
        };

        match result {
            Ok(reply) => {
                let assistant_message = reply.into_message();
                // Append to the conversation the send started in, which may
                // no longer be the current one.
                let Some(conversation) = self.conversations.get(conversation.id).await else {
                    return self.fail_send(ChatError::InvalidInput(
                        "conversation deleted during send".to_string(),
                    ))
                    .await;
                };
                let mut messages = conversation.messages;
                messages.push(assistant_message.clone());
                if let Err(err) = self
                    .conversations
                    .replace_messages(conversation.id, messages)
                    .await
                {
                    return self.fail_send(err).await;
                }

                self.log_to_history(&user_message).await;
                self.log_to_history(&assistant_message).await;
                self.clear_notice().await;
                info!(conversation = %conversation.id, "Delivered message");
                SendOutcome::Delivered(assistant_message)
            }
            Err(err) => {
                self.rollback(conversation.id, &user_message).await;
                self.fail_send(err).await
            }
        }
    }

    /// Remove the optimistic message from the conversation, which may
    /// already have been persisted with it.
    async fn rollback(&self, conversation: ConversationId, message: &Message) {
        let Some(found) = self.conversations.get(conversation).await else {
            return;
        };
        let messages: Vec<Message> = found
            .messages
            .into_iter()
            .filter(|m| m.id != message.id)
            .collect();
        if let Err(err) = self.conversations.replace_messages(conversation, messages).await {
            warn!(?err, "Rollback of optimistic message failed");
        }
    }

    async fn fail_send(&self, err: ChatError) -> SendOutcome {
        warn!(?err, "Send failed");
        let notice = self.notice_for(&err).await;
        SendOutcome::Failed(notice)
    }

    /// Classify a failure into a notice, storing it and scheduling the
    /// forced logout on auth failures.
    async fn notice_for(&self, err: &ChatError) -> Notice {
        let notice = if err.is_auth_failure() {
            Notice {
                kind: NoticeKind::SessionExpired,
                message: SESSION_EXPIRED.to_string(),
            }
        } else {
            Notice {
                kind: NoticeKind::OperationFailed,
                message: SEND_FAILED.to_string(),
            }
        };
        *self.notice.write().await = Some(notice.clone());
        if err.is_auth_failure() {
            self.schedule_forced_logout();
        }
        notice
    }

    async fn log_to_history(&self, message: &Message) {
        if let Err(err) = self.history.append(message).await {
            warn!(?err, "History log append failed");
        }
    }

    /// Clear the current conversation's messages, locally and remotely.
    ///
    /// A non-auth remote failure does not block the local clear; a
    /// rejected token keeps the messages and schedules the forced logout.
    pub async fn clear_chat(&self) -> ClearOutcome {
        let Some(conversation) = self.conversations.current().await else {
            return ClearOutcome::Ignored;
        };

        let result = match self.session.token().await {
            Some(token) => self.api.clear_history(&token).await,
            None => Err(ChatError::AuthRequired),
        };

        if let Err(err) = result {
            if err.is_auth_failure() {
                let notice = self.notice_for(&err).await;
                return ClearOutcome::Failed(notice);
            }
            warn!(?err, "Remote clear failed; clearing locally anyway");
        }

        if let Err(err) = self
            .conversations
            .replace_messages(conversation.id, Vec::new())
            .await
        {
            warn!(?err, "Local clear failed");
            let notice = self.notice_for(&err).await;
            return ClearOutcome::Failed(notice);
        }
        self.clear_notice().await;
        ClearOutcome::Cleared
    }

    /// Log in and install the session durably.
    pub async fn login(&self, email: &str, password: &str) -> LoginOutcome {
        match self.api.login(email, password).await {
            Ok(session) => {
                let user = session.user.clone();
                if let Err(err) = self.session.install(session).await {
                    warn!(?err, "Session install failed");
                    return LoginOutcome::Rejected(LOGIN_NETWORK_FAILED.to_string());
                }
                self.clear_notice().await;
                info!(user = %user.email, "Logged in");
                LoginOutcome::LoggedIn(user)
            }
            Err(ChatError::ServerRejected(message)) => LoginOutcome::Rejected(message),
            Err(err) => {
                warn!(?err, "Login failed");
                LoginOutcome::Rejected(LOGIN_NETWORK_FAILED.to_string())
            }
        }
    }

    /// Log out: best-effort remote notify, then unconditional local
    /// teardown of session, conversations and durable keys.
    ///
    /// # Errors
    /// Returns an error only if the durable store fails; the remote call
    /// never blocks teardown.
    pub async fn logout(&self) -> ChatResult<()> {
        if let Some(token) = self.session.token().await {
            if let Err(err) = self.api.logout(&token).await {
                warn!(?err, "Remote logout failed; proceeding with teardown");
            }
        }

        self.session.clear().await?;
        self.conversations.clear_all().await?;
        self.clear_notice().await;
        info!("Logged out");
        Ok(())
    }

    /// Fetch the server-side history for the presentation layer. Local
    /// state is not mutated; an auth failure still triggers the forced
    /// logout path.
    ///
    /// # Errors
    /// Returns the classified error alongside the notice handling.
    pub async fn fetch_history(&self) -> ChatResult<Vec<HistoryEntry>> {
        let result = match self.session.token().await {
            Some(token) => self.api.fetch_history(&token).await,
            None => Err(ChatError::AuthRequired),
        };
        match result {
            Ok(entries) => Ok(entries),
            Err(err) => {
                if err.is_auth_failure() {
                    self.notice_for(&err).await;
                }
                Err(err)
            }
        }
    }

    /// After the configured delay, run the full logout. The timer is not
    /// cancelled by interim actions.
    fn schedule_forced_logout(&self) {
        let engine = self.clone();
        let delay = self.config.session.logout_delay;
        debug!(?delay, "Scheduling forced logout");
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Err(err) = engine.logout().await {
                warn!(?err, "Forced logout failed");
            }
        });
    }
}
