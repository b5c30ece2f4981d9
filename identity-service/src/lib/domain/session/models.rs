use std::fmt;

use chrono::DateTime;
use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use crate::domain::user::models::UserId;

/// Session unique identifier type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A bearer token issued to a user, with the client it was issued to.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub id: SessionId,
    pub user_id: UserId,
    pub token: String,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub device_info: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub last_activity_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Open a session for a freshly issued token.
    pub fn open(
        user_id: UserId,
        token: String,
        client: &ClientContext,
        issued_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: SessionId::new(),
            user_id,
            token,
            ip_address: client.ip_address.clone(),
            user_agent: client.user_agent.clone(),
            device_info: client.device_info(),
            created_at: issued_at,
            last_activity_at: issued_at,
            expires_at,
        }
    }

    /// A session is usable strictly before its expiry instant.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}

/// Network origin of an authentication request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientContext {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl ClientContext {
    pub fn new(ip_address: Option<String>, user_agent: Option<String>) -> Self {
        Self {
            ip_address,
            user_agent,
        }
    }

    pub fn device_info(&self) -> serde_json::Value {
        json!({ "agent": self.user_agent.as_deref().unwrap_or("unknown") })
    }
}
