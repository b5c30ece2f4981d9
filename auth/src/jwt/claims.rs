use chrono::DateTime;
use chrono::Duration;
use chrono::TimeZone;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

/// Bearer token payload.
///
/// Carries the authenticated principal (`sub`, `email`, `role`) plus the
/// registered claims needed to bound the token's lifetime. `jti` is random
/// per token, so two tokens issued to the same user within the same second
/// are still distinct strings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    /// Subject (user identifier)
    pub sub: String,

    /// Email of the subject at issuance time
    pub email: String,

    /// Role reference of the subject at issuance time
    #[serde(default)]
    pub role: Option<String>,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// JWT ID (unique token identifier)
    pub jti: String,
}

impl Claims {
    /// Create claims for a user, expiring `ttl` after `issued_at`.
    ///
    /// # Arguments
    /// * `user_id` - Unique user identifier
    /// * `email` - User email
    /// * `role` - Optional role reference
    /// * `issued_at` - Issuance instant
    /// * `ttl` - Token lifetime
    pub fn for_user(
        user_id: impl ToString,
        email: impl Into<String>,
        role: Option<String>,
        issued_at: DateTime<Utc>,
        ttl: Duration,
    ) -> Self {
        Self {
            sub: user_id.to_string(),
            email: email.into(),
            role,
            iat: issued_at.timestamp(),
            exp: (issued_at + ttl).timestamp(),
            jti: Uuid::new_v4().to_string(),
        }
    }

    /// Expiration as a UTC instant.
    pub fn expires_at(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.exp, 0)
            .single()
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    /// Check if token is expired at the given Unix timestamp.
    pub fn is_expired(&self, current_timestamp: i64) -> bool {
        self.exp <= current_timestamp
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_user() {
        let now = Utc::now();
        let claims = Claims::for_user(
            "user123",
            "alice@example.com",
            Some("role-1".to_string()),
            now,
            Duration::days(7),
        );

        assert_eq!(claims.sub, "user123");
        assert_eq!(claims.email, "alice@example.com");
        assert_eq!(claims.role.as_deref(), Some("role-1"));
        assert_eq!(claims.exp - claims.iat, 7 * 24 * 60 * 60);
        assert_eq!(claims.expires_at().timestamp(), claims.exp);
    }

    #[test]
    fn test_jti_is_unique_per_token() {
        let now = Utc::now();
        let first = Claims::for_user("u", "a@x.com", None, now, Duration::hours(1));
        let second = Claims::for_user("u", "a@x.com", None, now, Duration::hours(1));

        assert_ne!(first.jti, second.jti);
    }

    #[test]
    fn test_is_expired() {
        let issued = Utc.timestamp_opt(1_000, 0).unwrap();
        let claims = Claims::for_user("u", "a@x.com", None, issued, Duration::seconds(100));

        assert!(!claims.is_expired(1_099));
        assert!(claims.is_expired(1_100)); // Exactly at expiration
        assert!(claims.is_expired(1_101));
    }

    #[test]
    fn test_missing_role_deserializes_as_none() {
        let json = serde_json::json!({
            "sub": "u",
            "email": "a@x.com",
            "iat": 1,
            "exp": 2,
            "jti": "j"
        });

        let claims: Claims = serde_json::from_value(json).unwrap();
        assert!(claims.role.is_none());
    }
}
