use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;

use crate::domain::session::errors::SessionError;
use crate::domain::session::models::Session;
use crate::domain::session::models::SessionId;
use crate::domain::user::models::UserId;

/// Persistence operations for issued sessions.
#[async_trait]
pub trait SessionRepository: Send + Sync + 'static {
    /// # Errors
    /// * `DuplicateToken` - Token already stored
    /// * `DatabaseError` - Database operation failed
    async fn create(&self, session: Session) -> Result<Session, SessionError>;

    /// Find the session holding `token` for `user_id` that has not expired at `now`.
    async fn find_valid(
        &self,
        user_id: &UserId,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Session>, SessionError>;

    /// Refresh the last activity timestamp.
    async fn touch(&self, id: &SessionId, at: DateTime<Utc>) -> Result<(), SessionError>;

    /// Delete the session holding `token` for `user_id`. Returns whether a row was removed.
    async fn delete(&self, user_id: &UserId, token: &str) -> Result<bool, SessionError>;

    /// Purge every session expired at `now`. Returns the number removed.
    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, SessionError>;
}
