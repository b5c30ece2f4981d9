use std::fmt;
use std::str::FromStr;

use chrono::DateTime;
use chrono::Utc;
use uuid::Uuid;

use crate::domain::role::models::RoleId;
use crate::domain::validation::ValidationErrors;
use crate::user::errors::EmailError;
use crate::user::errors::FullNameError;
use crate::user::errors::PasswordPolicyError;
use crate::user::errors::UserIdError;
use crate::user::errors::UsernameError;

/// User aggregate as exposed outside the authentication flow.
///
/// Carries no password material; see [`UserCredentials`].
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: UserId,
    pub username: Username,
    pub full_name: FullName,
    pub email: EmailAddress,
    pub role_id: Option<RoleId>,
    pub active: bool,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A user together with its stored password hash.
///
/// Only produced for credential checks and account creation.
#[derive(Clone)]
pub struct UserCredentials {
    pub user: User,
    pub password_hash: String,
}

impl fmt::Debug for UserCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserCredentials")
            .field("user", &self.user)
            .field("password_hash", &"<redacted>")
            .finish()
    }
}

/// User unique identifier type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UserId(pub Uuid);

impl UserId {
    /// Generate a new time-ordered user ID (UUID v7).
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Parse a user ID from string.
    ///
    /// # Errors
    /// * `InvalidFormat` - String is not a valid UUID
    pub fn from_string(s: &str) -> Result<Self, UserIdError> {
        Uuid::parse_str(s)
            .map(UserId)
            .map_err(|e| UserIdError::InvalidFormat(e.to_string()))
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Username value type
///
/// 3-100 characters of ASCII letters, digits and underscore.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Username(String);

impl Username {
    const MIN_LENGTH: usize = 3;
    const MAX_LENGTH: usize = 100;

    /// Create a new valid username.
    ///
    /// # Errors
    /// * `TooShort` - Username shorter than 3 characters
    /// * `TooLong` - Username longer than 100 characters
    /// * `InvalidCharacters` - Anything other than `[A-Za-z0-9_]`
    pub fn new(username: String) -> Result<Self, UsernameError> {
        let length = username.chars().count();
        if length < Self::MIN_LENGTH {
            return Err(UsernameError::TooShort {
                min: Self::MIN_LENGTH,
                actual: length,
            });
        }
        if length > Self::MAX_LENGTH {
            return Err(UsernameError::TooLong {
                max: Self::MAX_LENGTH,
                actual: length,
            });
        }
        if !username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            return Err(UsernameError::InvalidCharacters);
        }
        Ok(Self(username))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Display name of a user, trimmed, never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FullName(String);

impl FullName {
    const MAX_LENGTH: usize = 255;

    /// # Errors
    /// * `Empty` - Blank after trimming
    /// * `TooLong` - Longer than 255 characters
    pub fn new(full_name: String) -> Result<Self, FullNameError> {
        let trimmed = full_name.trim();
        if trimmed.is_empty() {
            return Err(FullNameError::Empty);
        }
        let length = trimmed.chars().count();
        if length > Self::MAX_LENGTH {
            return Err(FullNameError::TooLong {
                max: Self::MAX_LENGTH,
                actual: length,
            });
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Email address type
///
/// Validates email format using RFC 5322 compliant parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailAddress(String);

impl EmailAddress {
    const MAX_LENGTH: usize = 255;

    /// Create a new validated email address.
    ///
    /// # Errors
    /// * `InvalidFormat` - Email does not conform to RFC 5322
    /// * `TooLong` - Longer than 255 characters
    pub fn new(email: String) -> Result<Self, EmailError> {
        if email.len() > Self::MAX_LENGTH {
            return Err(EmailError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }
        email_address::EmailAddress::from_str(&email)
            .map(|_| EmailAddress(email))
            .map_err(|e| EmailError::InvalidFormat(e.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Plaintext password accepted for hashing.
///
/// Never printed; dropped as soon as it has been hashed.
#[derive(Clone, PartialEq, Eq)]
pub struct Password(String);

impl Password {
    const MIN_LENGTH: usize = 6;

    /// # Errors
    /// * `TooShort` - Fewer than 6 characters
    pub fn new(password: String) -> Result<Self, PasswordPolicyError> {
        if password.chars().count() < Self::MIN_LENGTH {
            return Err(PasswordPolicyError::TooShort {
                min: Self::MIN_LENGTH,
            });
        }
        Ok(Self(password))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(<redacted>)")
    }
}

/// Unvalidated input for creating a user, as received from a client.
#[derive(Clone, Default)]
pub struct UserDraft {
    pub username: String,
    pub full_name: String,
    pub email: String,
    pub password: String,
    pub role_id: Option<String>,
    pub active: Option<bool>,
}

/// Command to create a new user with domain types
#[derive(Debug, Clone)]
pub struct CreateUserCommand {
    pub username: Username,
    pub full_name: FullName,
    pub email: EmailAddress,
    pub password: Password,
    pub role_id: Option<RoleId>,
    pub active: bool,
}

impl TryFrom<UserDraft> for CreateUserCommand {
    type Error = ValidationErrors;

    /// Validate every field, reporting all violations at once.
    fn try_from(draft: UserDraft) -> Result<Self, Self::Error> {
        let mut errors = ValidationErrors::new();

        let username = errors.check("username", Username::new(draft.username));
        let full_name = errors.check("fullName", FullName::new(draft.full_name));
        let email = errors.check("email", EmailAddress::new(draft.email));
        let password = errors.check("password", Password::new(draft.password));
        let role_id = draft
            .role_id
            .and_then(|id| errors.check("roleId", RoleId::from_string(&id)));

        match (username, full_name, email, password) {
            (Some(username), Some(full_name), Some(email), Some(password)) if errors.is_empty() => {
                Ok(Self {
                    username,
                    full_name,
                    email,
                    password,
                    role_id,
                    active: draft.active.unwrap_or(true),
                })
            }
            _ => Err(errors),
        }
    }
}

/// Unvalidated partial update, as received from a client.
///
/// `role_id`: `None` leaves the role untouched, `Some(None)` clears it.
#[derive(Debug, Clone, Default)]
pub struct UserPatch {
    pub username: Option<String>,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub role_id: Option<Option<String>>,
    pub active: Option<bool>,
}

/// Command to update an existing user with optional validated fields.
///
/// Passwords are not changed through this command.
#[derive(Debug, Clone, Default)]
pub struct UpdateUserCommand {
    pub username: Option<Username>,
    pub full_name: Option<FullName>,
    pub email: Option<EmailAddress>,
    pub role_id: Option<Option<RoleId>>,
    pub active: Option<bool>,
}

impl TryFrom<UserPatch> for UpdateUserCommand {
    type Error = ValidationErrors;

    fn try_from(patch: UserPatch) -> Result<Self, Self::Error> {
        let mut errors = ValidationErrors::new();

        let username = patch
            .username
            .and_then(|u| errors.check("username", Username::new(u)));
        let full_name = patch
            .full_name
            .and_then(|n| errors.check("fullName", FullName::new(n)));
        let email = patch
            .email
            .and_then(|e| errors.check("email", EmailAddress::new(e)));
        let role_id = match patch.role_id {
            None => None,
            Some(None) => Some(None),
            Some(Some(id)) => errors
                .check("roleId", RoleId::from_string(&id))
                .map(Some),
        };

        errors.finish()?;

        Ok(Self {
            username,
            full_name,
            email,
            role_id,
            active: patch.active,
        })
    }
}
