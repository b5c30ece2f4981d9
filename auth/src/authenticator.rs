use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;

use crate::jwt::Claims;
use crate::jwt::JwtError;
use crate::jwt::JwtHandler;
use crate::password::PasswordError;
use crate::password::PasswordHasher;

/// Authentication coordinator combining password verification and token issuance.
///
/// Owns the process-wide signing secret and the token lifetime. Built once at
/// startup and shared behind an `Arc`.
pub struct Authenticator {
    password_hasher: PasswordHasher,
    jwt_handler: JwtHandler,
    token_ttl: Duration,
}

/// A freshly signed bearer token.
#[derive(Debug, Clone, PartialEq)]
pub struct IssuedToken {
    /// Signed bearer token
    pub access_token: String,
    /// Decoded claims embedded in the token
    pub claims: Claims,
}

impl IssuedToken {
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.claims.expires_at()
    }
}

/// Authentication operation errors.
#[derive(Debug, thiserror::Error)]
pub enum AuthenticationError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Password error: {0}")]
    PasswordError(#[from] PasswordError),

    #[error("JWT error: {0}")]
    JwtError(#[from] JwtError),
}

impl Authenticator {
    /// Default bearer token lifetime.
    pub const DEFAULT_TOKEN_TTL_HOURS: i64 = 7 * 24;

    /// Create a new authenticator.
    ///
    /// # Arguments
    /// * `jwt_secret` - Secret key for JWT signing (at least 32 bytes)
    /// * `token_ttl` - Lifetime of issued tokens
    ///
    /// # Errors
    /// * `WeakSecret` - Secret shorter than 32 bytes
    pub fn new(jwt_secret: &[u8], token_ttl: Duration) -> Result<Self, JwtError> {
        Ok(Self {
            password_hasher: PasswordHasher::new(),
            jwt_handler: JwtHandler::new(jwt_secret)?,
            token_ttl,
        })
    }

    /// Replace the password hasher (e.g. cheaper parameters in tests).
    pub fn with_password_hasher(mut self, password_hasher: PasswordHasher) -> Self {
        self.password_hasher = password_hasher;
        self
    }

    pub fn token_ttl(&self) -> Duration {
        self.token_ttl
    }

    /// Hash a password for storage.
    ///
    /// # Errors
    /// * `PasswordError` - Hashing operation failed
    pub fn hash_password(&self, password: &str) -> Result<String, PasswordError> {
        self.password_hasher.hash(password)
    }

    /// Verify credentials and issue a token for the subject.
    ///
    /// # Errors
    /// * `InvalidCredentials` - Password does not match
    /// * `PasswordError` - Stored hash unreadable
    /// * `JwtError` - Token generation failed
    pub fn authenticate(
        &self,
        password: &str,
        stored_hash: &str,
        subject: &str,
        email: &str,
        role: Option<String>,
    ) -> Result<IssuedToken, AuthenticationError> {
        if !self.password_hasher.verify(password, stored_hash)? {
            return Err(AuthenticationError::InvalidCredentials);
        }

        Ok(self.issue_token(subject, email, role)?)
    }

    /// Issue a token without password verification (e.g. right after registration).
    ///
    /// # Errors
    /// * `EncodingFailed` - Token generation failed
    pub fn issue_token(
        &self,
        subject: &str,
        email: &str,
        role: Option<String>,
    ) -> Result<IssuedToken, JwtError> {
        let claims = Claims::for_user(subject, email, role, Utc::now(), self.token_ttl);
        let access_token = self.jwt_handler.encode(&claims)?;

        Ok(IssuedToken {
            access_token,
            claims,
        })
    }

    /// Validate and decode a bearer token.
    ///
    /// # Errors
    /// * `TokenExpired` - Token past its `exp`
    /// * `InvalidToken` - Bad signature, malformed token or missing claims
    pub fn validate_token(&self, token: &str) -> Result<Claims, JwtError> {
        self.jwt_handler.decode(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"test_secret_key_at_least_32_bytes!";

    fn authenticator() -> Authenticator {
        Authenticator::new(SECRET, Duration::hours(Authenticator::DEFAULT_TOKEN_TTL_HOURS))
            .unwrap()
            .with_password_hasher(PasswordHasher::with_cost(8 * 1024, 1, 1).unwrap())
    }

    #[test]
    fn test_authenticate_success() {
        let authenticator = authenticator();
        let hash = authenticator
            .hash_password("secret1")
            .expect("Failed to hash password");

        let issued = authenticator
            .authenticate("secret1", &hash, "user123", "a@x.com", None)
            .expect("Authentication failed");

        let decoded = authenticator
            .validate_token(&issued.access_token)
            .expect("Token validation failed");
        assert_eq!(decoded.sub, "user123");
        assert_eq!(decoded.email, "a@x.com");
        assert_eq!(decoded, issued.claims);
    }

    #[test]
    fn test_authenticate_invalid_password() {
        let authenticator = authenticator();
        let hash = authenticator.hash_password("secret1").unwrap();

        let result = authenticator.authenticate("wrong", &hash, "user123", "a@x.com", None);
        assert!(matches!(
            result,
            Err(AuthenticationError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_issued_token_expires_after_ttl() {
        let authenticator = authenticator();
        let issued = authenticator
            .issue_token("user123", "a@x.com", Some("role".to_string()))
            .unwrap();

        let lifetime = issued.expires_at() - Utc::now();
        assert!(lifetime <= Duration::days(7));
        assert!(lifetime > Duration::days(7) - Duration::minutes(1));
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let authenticator = Authenticator::new(SECRET, Duration::seconds(-5)).unwrap();
        let issued = authenticator.issue_token("user123", "a@x.com", None).unwrap();

        let result = authenticator.validate_token(&issued.access_token);
        assert_eq!(result, Err(JwtError::TokenExpired));
    }

    #[test]
    fn test_rejects_weak_secret() {
        let result = Authenticator::new(b"short", Duration::hours(1));
        assert!(matches!(result, Err(JwtError::WeakSecret { .. })));
    }

    #[test]
    fn test_validate_invalid_token() {
        let authenticator = authenticator();
        let result = authenticator.validate_token("invalid.token.here");
        assert!(result.is_err());
    }
}
