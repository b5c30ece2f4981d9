use std::fmt;

use chrono::DateTime;
use chrono::Utc;

use crate::domain::auth::errors::AuthError;
use crate::domain::role::models::RoleId;
use crate::domain::user::models::CreateUserCommand;
use crate::domain::user::models::EmailAddress;
use crate::domain::user::models::FullName;
use crate::domain::user::models::Password;
use crate::domain::user::models::User;
use crate::domain::user::models::UserDraft;
use crate::domain::user::models::UserId;
use crate::domain::user::models::Username;
use crate::domain::validation::ValidationErrors;

/// Self-service sign-up. Always yields an active account without a role.
#[derive(Debug, Clone)]
pub struct RegisterCommand {
    pub username: Username,
    pub full_name: FullName,
    pub email: EmailAddress,
    pub password: Password,
}

impl TryFrom<UserDraft> for RegisterCommand {
    type Error = ValidationErrors;

    /// Validate with the user creation rules. `role_id` and `active` are ignored.
    fn try_from(draft: UserDraft) -> Result<Self, Self::Error> {
        let command = CreateUserCommand::try_from(UserDraft {
            role_id: None,
            active: None,
            ..draft
        })?;

        Ok(Self {
            username: command.username,
            full_name: command.full_name,
            email: command.email,
            password: command.password,
        })
    }
}

impl From<RegisterCommand> for CreateUserCommand {
    fn from(command: RegisterCommand) -> Self {
        CreateUserCommand {
            username: command.username,
            full_name: command.full_name,
            email: command.email,
            password: command.password,
            role_id: None,
            active: true,
        }
    }
}

/// Email and password as submitted to login.
#[derive(Clone)]
pub struct LoginCommand {
    pub email: String,
    pub password: String,
}

impl LoginCommand {
    /// # Errors
    /// * `Validation` - Either field is empty
    pub fn new(email: String, password: String) -> Result<Self, AuthError> {
        let mut errors = ValidationErrors::new();
        if email.trim().is_empty() {
            errors.add("email", "is required");
        }
        if password.is_empty() {
            errors.add("password", "is required");
        }
        errors.finish()?;

        Ok(Self {
            email: email.trim().to_string(),
            password,
        })
    }
}

impl fmt::Debug for LoginCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginCommand")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Result of a successful register or login.
#[derive(Debug, Clone)]
pub struct AuthOutcome {
    pub user: User,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Identity attached to a request that passed the authorization gate.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthenticatedUser {
    pub user_id: UserId,
    pub email: String,
    pub role_id: Option<RoleId>,
    /// Name of the user's role, absent when unassigned or inactive.
    pub role_name: Option<String>,
    pub token: String,
}

impl AuthenticatedUser {
    /// Check the resolved role name against an allow-list.
    ///
    /// # Errors
    /// * `MissingRole` - No active role resolved
    /// * `InsufficientRole` - Role not in `allowed`
    pub fn require_any_role(&self, allowed: &[&str]) -> Result<(), AuthError> {
        match &self.role_name {
            None => Err(AuthError::MissingRole),
            Some(name) if allowed.contains(&name.as_str()) => Ok(()),
            Some(_) => Err(AuthError::InsufficientRole),
        }
    }
}
