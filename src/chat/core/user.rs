//! Authenticated user and session types.

use serde::{Deserialize, Serialize};

/// A logged-in user as returned by the login endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Server-side user identifier.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Login email.
    pub email: String,
    /// Role names granted to the user.
    #[serde(default)]
    pub roles: Vec<String>,
    /// Permission names granted to the user.
    #[serde(default)]
    pub permissions: Vec<String>,
    /// Tenant the user belongs to, if any.
    #[serde(default)]
    pub tenant: Option<String>,
}

/// An active session: exactly one at a time, or none.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// The authenticated user.
    pub user: User,
    /// Bearer token for authenticated API calls.
    pub token: String,
}
