//! Authenticated HTTP client for the remote chat API.
//!
//! Transport and status handling live here so callers only ever see typed
//! [`ChatError`] values: HTTP 401 becomes `AuthFailed`, transport failures
//! become `Network`, and a reachable server that reports failure becomes
//! `ServerRejected`.

use std::future::Future;
use std::pin::Pin;

use tracing::debug;
use url::Url;

use crate::chat::core::config::ApiConfig;
use crate::chat::core::errors::{ChatError, ChatResult};
use crate::chat::core::user::Session;
use crate::chat::remote::types::{
    ChatEnvelope, ChatReply, ChatRequest, HistoryEntry, HistoryEnvelope, LoginEnvelope,
    LoginRequest,
};

/// Login endpoint path.
const LOGIN: &str = "/login";
/// Logout endpoint path.
const LOGOUT: &str = "/logout";
/// Chat (send message) endpoint path.
const CHAT: &str = "/chat";
/// Chat history endpoint path.
const CHAT_HISTORY: &str = "/chat/history";
/// Clear chat endpoint path.
const CLEAR_CHAT: &str = "/chat/clear";

/// Boxed future type for API operations.
pub type ApiFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Trait for the remote chat API collaborator.
pub trait ChatApi: Send + Sync {
    /// Exchange credentials for a session.
    fn login(&self, email: &str, password: &str) -> ApiFuture<'_, ChatResult<Session>>;

    /// Invalidate the session server-side. Best-effort for callers.
    fn logout(&self, token: &str) -> ApiFuture<'_, ChatResult<()>>;

    /// Send a user message and return the assistant reply payload.
    fn send_message(&self, token: &str, message: &str) -> ApiFuture<'_, ChatResult<ChatReply>>;

    /// Fetch the server-side message history.
    fn fetch_history(&self, token: &str) -> ApiFuture<'_, ChatResult<Vec<HistoryEntry>>>;

    /// Clear the server-side message history.
    fn clear_history(&self, token: &str) -> ApiFuture<'_, ChatResult<()>>;
}

/// `reqwest` implementation of the chat API.
pub struct HttpChatApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpChatApi {
    /// Build a client for the configured backend.
    ///
    /// # Errors
    /// Returns an error if the base URL is invalid or the HTTP client
    /// cannot be constructed.
    pub fn new(config: &ApiConfig) -> ChatResult<Self> {
        Url::parse(&config.base_url)?;
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Build the absolute endpoint URL. The base URL carries the API prefix,
    /// so paths are appended, not resolved.
    fn endpoint(&self, path: &str) -> ChatResult<Url> {
        Ok(Url::parse(&format!("{}{path}", self.base_url))?)
    }

    /// Map a non-2xx status to a typed error.
    fn check_status(status: reqwest::StatusCode) -> ChatResult<()> {
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(ChatError::AuthFailed);
        }
        if !status.is_success() {
            return Err(ChatError::ServerRejected(format!("HTTP status {status}")));
        }
        Ok(())
    }
}

impl ChatApi for HttpChatApi {
    fn login(&self, email: &str, password: &str) -> ApiFuture<'_, ChatResult<Session>> {
        let email = email.to_string();
        let password = password.to_string();
        Box::pin(async move {
            let url = self.endpoint(LOGIN)?;
            let response = self
                .client
                .post(url)
                .json(&LoginRequest {
                    email: &email,
                    password: &password,
                })
                .send()
                .await?;

            // The login endpoint reports failure through the envelope, so the
            // body is parsed before the status is judged.
            let status = response.status();
            let envelope: LoginEnvelope = response.json().await?;

            match envelope.data {
                Some(data) if status.is_success() && envelope.success => {
                    debug!(email = %email, "Login accepted");
                    Ok(data.into())
                }
                _ => Err(ChatError::ServerRejected(
                    envelope.message.unwrap_or_else(|| "Login failed".to_string()),
                )),
            }
        })
    }

    fn logout(&self, token: &str) -> ApiFuture<'_, ChatResult<()>> {
        let token = token.to_string();
        Box::pin(async move {
            let url = self.endpoint(LOGOUT)?;
            let response = self.client.post(url).bearer_auth(&token).send().await?;
            Self::check_status(response.status())
        })
    }

    fn send_message(&self, token: &str, message: &str) -> ApiFuture<'_, ChatResult<ChatReply>> {
        let token = token.to_string();
        let message = message.to_string();
        Box::pin(async move {
            let url = self.endpoint(CHAT)?;
            let response = self
                .client
                .post(url)
                .bearer_auth(&token)
                .json(&ChatRequest { message: &message })
                .send()
                .await?;

            Self::check_status(response.status())?;

            let envelope: ChatEnvelope = response.json().await?;
            match envelope.data {
                Some(reply) if envelope.success => Ok(reply),
                _ => Err(ChatError::ServerRejected(
                    "no assistant reply in response".to_string(),
                )),
            }
        })
    }

    fn fetch_history(&self, token: &str) -> ApiFuture<'_, ChatResult<Vec<HistoryEntry>>> {
        let token = token.to_string();
        Box::pin(async move {
            let url = self.endpoint(CHAT_HISTORY)?;
            let response = self.client.get(url).bearer_auth(&token).send().await?;

            Self::check_status(response.status())?;

            let envelope: HistoryEnvelope = response.json().await?;
            if envelope.success {
                Ok(envelope.data)
            } else {
                Err(ChatError::ServerRejected(
                    "history fetch reported failure".to_string(),
                ))
            }
        })
    }

    fn clear_history(&self, token: &str) -> ApiFuture<'_, ChatResult<()>> {
        let token = token.to_string();
        Box::pin(async move {
            let url = self.endpoint(CLEAR_CHAT)?;
            let response = self.client.post(url).bearer_auth(&token).send().await?;
            Self::check_status(response.status())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn api() -> HttpChatApi {
        HttpChatApi::new(&ApiConfig {
            base_url: "http://127.0.0.1:8000/api/".to_string(),
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    #[test]
    fn endpoints_append_to_the_api_prefix() {
        let api = api();
        assert_eq!(
            api.endpoint(CHAT).unwrap().as_str(),
            "http://127.0.0.1:8000/api/chat"
        );
        assert_eq!(
            api.endpoint(CHAT_HISTORY).unwrap().as_str(),
            "http://127.0.0.1:8000/api/chat/history"
        );
    }

    #[test]
    fn unauthorized_status_maps_to_auth_failed() {
        assert!(matches!(
            HttpChatApi::check_status(reqwest::StatusCode::UNAUTHORIZED),
            Err(ChatError::AuthFailed)
        ));
    }

    #[test]
    fn server_errors_map_to_rejection() {
        assert!(matches!(
            HttpChatApi::check_status(reqwest::StatusCode::INTERNAL_SERVER_ERROR),
            Err(ChatError::ServerRejected(_))
        ));
        assert!(HttpChatApi::check_status(reqwest::StatusCode::OK).is_ok());
    }

    #[test]
    fn rejects_invalid_base_url() {
        let result = HttpChatApi::new(&ApiConfig {
            base_url: "not a url".to_string(),
            timeout: Duration::from_secs(5),
        });
        assert!(result.is_err());
    }
}
