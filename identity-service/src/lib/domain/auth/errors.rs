use thiserror::Error;

use crate::domain::role::errors::RoleError;
use crate::domain::session::errors::SessionError;
use crate::domain::validation::ValidationErrors;
use crate::user::errors::UserError;

/// Errors of the authentication flow and the request gates.
///
/// Display strings are the client-facing messages.
#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error("{0}")]
    Validation(#[from] ValidationErrors),

    #[error(transparent)]
    User(#[from] UserError),

    #[error(transparent)]
    Role(#[from] RoleError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Account is inactive")]
    AccountInactive,

    #[error("No token provided")]
    MissingToken,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Invalid or expired session")]
    InvalidSession,

    #[error("User not found or inactive")]
    UserUnavailable,

    #[error("Access denied: user has no role")]
    MissingRole,

    #[error("Access denied: insufficient permissions")]
    InsufficientRole,

    #[error("Token issuing failed: {0}")]
    TokenIssuing(String),

    #[error("Password hashing failed: {0}")]
    PasswordHashing(String),
}
