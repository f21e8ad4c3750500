//! Session gate: holder of the authenticated user.
//!
//! At most one session is active at a time. The gate persists the bearer
//! token and the user record under their own durable keys so a restarted
//! client can resume without logging in again.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::chat::core::errors::ChatResult;
use crate::chat::core::user::{Session, User};
use crate::chat::storage::kv::{DurableStore, keys};

/// Authenticated-state holder gating all conversation operations.
pub struct SessionGate {
    durable: Arc<dyn DurableStore>,
    inner: RwLock<Option<Session>>,
}

impl SessionGate {
    /// Create a gate with no active session.
    #[must_use]
    pub fn new(durable: Arc<dyn DurableStore>) -> Self {
        Self {
            durable,
            inner: RwLock::new(None),
        }
    }

    /// Restore a session from the durable token and user record, if both
    /// are present. A corrupt user record clears both keys instead of
    /// resurrecting a half-broken session.
    ///
    /// # Errors
    /// Returns an error if the durable store fails.
    pub async fn hydrate(&self) -> ChatResult<()> {
        let Some(token) = self.durable.get(keys::AUTH_TOKEN).await? else {
            return Ok(());
        };
        let Some(user_json) = self.durable.get(keys::USER).await? else {
            return Ok(());
        };

        let user: User = match serde_json::from_str(&user_json) {
            Ok(user) => user,
            Err(err) => {
                warn!(?err, "Discarding corrupt user record");
                self.durable.remove(keys::USER).await?;
                self.durable.remove(keys::AUTH_TOKEN).await?;
                return Ok(());
            }
        };

        debug!(user = %user.email, "Hydrated session");
        *self.inner.write().await = Some(Session { user, token });
        Ok(())
    }

    /// Install a session: persist the token and user record and make the
    /// session current.
    ///
    /// # Errors
    /// Returns an error if the durable store fails.
    pub async fn install(&self, session: Session) -> ChatResult<()> {
        let user_json = serde_json::to_string(&session.user)?;
        self.durable.put(keys::USER, user_json).await?;
        self.durable
            .put(keys::AUTH_TOKEN, session.token.clone())
            .await?;
        *self.inner.write().await = Some(session);
        Ok(())
    }

    /// Tear the session down: drop the in-memory session and remove both
    /// durable keys.
    ///
    /// # Errors
    /// Returns an error if the durable store fails.
    pub async fn clear(&self) -> ChatResult<()> {
        *self.inner.write().await = None;
        self.durable.remove(keys::AUTH_TOKEN).await?;
        self.durable.remove(keys::USER).await?;
        Ok(())
    }

    /// Whether a session is active.
    pub async fn is_authenticated(&self) -> bool {
        self.inner.read().await.is_some()
    }

    /// The authenticated user, if any.
    pub async fn current_user(&self) -> Option<User> {
        self.inner.read().await.as_ref().map(|s| s.user.clone())
    }

    /// The bearer token of the active session, if any.
    pub async fn token(&self) -> Option<String> {
        self.inner.read().await.as_ref().map(|s| s.token.clone())
    }
}
