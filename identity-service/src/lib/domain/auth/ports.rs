use async_trait::async_trait;

use crate::domain::auth::errors::AuthError;
use crate::domain::auth::models::AuthOutcome;
use crate::domain::auth::models::AuthenticatedUser;
use crate::domain::auth::models::LoginCommand;
use crate::domain::auth::models::RegisterCommand;
use crate::domain::session::models::ClientContext;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;

/// Port for the authentication flow and the per-request authorization check.
#[async_trait]
pub trait AuthServicePort: Send + Sync + 'static {
    /// Create an account and open its first session.
    ///
    /// # Arguments
    /// * `command` - Validated registration fields
    /// * `client` - Origin recorded on the session
    ///
    /// # Errors
    /// * `User(UsernameAlreadyExists)` / `User(EmailAlreadyExists)` - Conflict
    /// * `TokenIssuing`, `PasswordHashing`, `Session` - Internal failures
    async fn register(
        &self,
        command: RegisterCommand,
        client: &ClientContext,
    ) -> Result<AuthOutcome, AuthError>;

    /// Verify credentials and open a new session.
    ///
    /// # Errors
    /// * `InvalidCredentials` - Unknown email or wrong password
    /// * `AccountInactive` - Password matched a deactivated account
    async fn login(
        &self,
        command: LoginCommand,
        client: &ClientContext,
    ) -> Result<AuthOutcome, AuthError>;

    /// Close the session holding `token`. Closing an unknown session succeeds.
    async fn logout(&self, user_id: &UserId, token: &str) -> Result<(), AuthError>;

    /// # Errors
    /// * `User(NotFound)` - User no longer exists
    async fn profile(&self, user_id: &UserId) -> Result<User, AuthError>;

    /// Resolve a bearer token to the identity it grants.
    ///
    /// # Errors
    /// * `InvalidToken` - Bad signature, malformed or expired token
    /// * `InvalidSession` - No unexpired session holds the token
    /// * `UserUnavailable` - User deleted or deactivated
    async fn authorize(&self, token: &str) -> Result<AuthenticatedUser, AuthError>;
}
