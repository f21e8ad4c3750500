//! Wire types for the remote chat API.
//!
//! The backend wraps payloads in a `{success, data}` envelope and leaves
//! some reply fields optional; fallbacks for missing fields are generated
//! deterministically on the client (fresh id, current time).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::chat::core::conversation::Message;
use crate::chat::core::ids::MessageId;
use crate::chat::core::user::{Session, User};

/// Login request body.
#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    /// Login email.
    pub email: &'a str,
    /// Password.
    pub password: &'a str,
}

/// Envelope of the login endpoint.
#[derive(Debug, Deserialize)]
pub struct LoginEnvelope {
    /// Whether the login succeeded.
    #[serde(default)]
    pub success: bool,
    /// Server-provided failure message.
    #[serde(default)]
    pub message: Option<String>,
    /// Payload, present on success.
    #[serde(default)]
    pub data: Option<LoginData>,
}

/// Login payload: the user record plus the bearer token.
#[derive(Debug, Deserialize)]
pub struct LoginData {
    /// Server-side user identifier.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Login email.
    pub email: String,
    /// Role names.
    #[serde(default)]
    pub roles: Vec<String>,
    /// Permission names.
    #[serde(default)]
    pub permissions: Vec<String>,
    /// Tenant, if any.
    #[serde(default)]
    pub tenant: Option<String>,
    /// Bearer token for subsequent calls.
    pub token: String,
}

impl From<LoginData> for Session {
    fn from(data: LoginData) -> Self {
        Self {
            user: User {
                id: data.id,
                name: data.name,
                email: data.email,
                roles: data.roles,
                permissions: data.permissions,
                tenant: data.tenant,
            },
            token: data.token,
        }
    }
}

/// Chat request body.
#[derive(Debug, Serialize)]
pub struct ChatRequest<'a> {
    /// The user's message text.
    pub message: &'a str,
}

/// Envelope of the chat endpoint.
#[derive(Debug, Deserialize)]
pub struct ChatEnvelope {
    /// Whether the send succeeded.
    #[serde(default)]
    pub success: bool,
    /// Payload, present on success.
    #[serde(default)]
    pub data: Option<ChatReply>,
}

/// Assistant reply as sent by the server. `message_id` and `timestamp` are
/// not guaranteed to be present.
#[derive(Clone, Debug, Deserialize)]
pub struct ChatReply {
    /// Server-assigned message id, if any.
    #[serde(default)]
    pub message_id: Option<String>,
    /// Reply text.
    pub response: String,
    /// Server-side timestamp, if any.
    #[serde(default)]
    pub timestamp: Option<String>,
}

impl ChatReply {
    /// Convert into an assistant [`Message`], generating a fresh id and
    /// using the current time wherever the server left a hole. A
    /// non-UUID server id is kept only if it parses; otherwise a client
    /// id is generated.
    #[must_use]
    pub fn into_message(self) -> Message {
        let id = self
            .message_id
            .as_deref()
            .and_then(|raw| raw.parse::<MessageId>().ok())
            .unwrap_or_default();
        let timestamp = self
            .timestamp
            .as_deref()
            .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
            .map_or_else(Utc::now, |parsed| parsed.with_timezone(&Utc));
        Message::assistant(id, self.response, timestamp)
    }
}

/// Envelope of the history endpoint.
#[derive(Debug, Deserialize)]
pub struct HistoryEnvelope {
    /// Whether the fetch succeeded.
    #[serde(default)]
    pub success: bool,
    /// Logged exchanges, oldest first.
    #[serde(default)]
    pub data: Vec<HistoryEntry>,
}

/// One logged exchange from the server-side history.
#[derive(Clone, Debug, Deserialize)]
pub struct HistoryEntry {
    /// Server-assigned message id, if any.
    #[serde(default)]
    pub message_id: Option<String>,
    /// The user's message text.
    #[serde(default)]
    pub message: String,
    /// The assistant's reply, if one was produced.
    #[serde(default)]
    pub response: Option<String>,
    /// Server-side timestamp, if any.
    #[serde(default)]
    pub timestamp: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn reply_with_all_fields_is_kept() {
        let server_id = Uuid::new_v4().to_string();
        let reply = ChatReply {
            message_id: Some(server_id.clone()),
            response: "Hi!".to_string(),
            timestamp: Some("2026-08-05T10:00:00+00:00".to_string()),
        };
        let message = reply.into_message();
        assert_eq!(message.id.to_string(), server_id);
        assert_eq!(message.text, "Hi!");
        assert!(!message.from_user);
        assert_eq!(message.timestamp.to_rfc3339(), "2026-08-05T10:00:00+00:00");
    }

    #[test]
    fn missing_fields_get_client_fallbacks() {
        let before = Utc::now();
        let reply = ChatReply {
            message_id: None,
            response: "Hi!".to_string(),
            timestamp: None,
        };
        let message = reply.into_message();
        assert!(message.timestamp >= before);
        assert!(message.timestamp <= Utc::now());
    }

    #[test]
    fn unparseable_server_fields_fall_back() {
        let reply = ChatReply {
            message_id: Some("42".to_string()),
            response: "Hi!".to_string(),
            timestamp: Some("yesterday-ish".to_string()),
        };
        // Falls back rather than failing the whole send.
        let message = reply.into_message();
        assert_eq!(message.text, "Hi!");
    }

    #[test]
    fn login_data_maps_to_session() {
        let data: LoginData = serde_json::from_str(
            r#"{"id": 3, "name": "Ana", "email": "ana@example.com",
                "roles": ["admin"], "permissions": ["chat"],
                "tenant": "acme", "token": "tok"}"#,
        )
        .unwrap();
        let session: Session = data.into();
        assert_eq!(session.user.name, "Ana");
        assert_eq!(session.user.tenant.as_deref(), Some("acme"));
        assert_eq!(session.token, "tok");
    }

    #[test]
    fn chat_envelope_tolerates_missing_data() {
        let envelope: ChatEnvelope = serde_json::from_str(r#"{"success": false}"#).unwrap();
        assert!(!envelope.success);
        assert!(envelope.data.is_none());
    }
}
