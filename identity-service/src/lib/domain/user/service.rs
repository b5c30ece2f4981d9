use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use crate::domain::pagination::Page;
use crate::domain::pagination::PageRequest;
use crate::domain::user::models::CreateUserCommand;
use crate::domain::user::models::EmailAddress;
use crate::domain::user::models::UpdateUserCommand;
use crate::domain::user::models::User;
use crate::domain::user::models::UserCredentials;
use crate::domain::user::models::UserId;
use crate::domain::user::models::Username;
use crate::user::errors::UserError;
use crate::user::ports::UserRepository;
use crate::user::ports::UserServicePort;

/// Domain service implementation for user administration.
pub struct UserService<UR>
where
    UR: UserRepository,
{
    repository: Arc<UR>,
    password_hasher: Arc<auth::PasswordHasher>,
}

impl<UR> UserService<UR>
where
    UR: UserRepository,
{
    pub fn new(repository: Arc<UR>) -> Self {
        Self {
            repository,
            password_hasher: Arc::new(auth::PasswordHasher::new()),
        }
    }

    pub fn with_password_hasher(mut self, password_hasher: auth::PasswordHasher) -> Self {
        self.password_hasher = Arc::new(password_hasher);
        self
    }

    async fn find_existing(&self, id: &UserId) -> Result<User, UserError> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| UserError::NotFound(id.to_string()))
    }
}

/// Fail with a conflict when `username` or `email` belongs to a user other than `owner`.
///
/// Username is checked first, matching the order clients see errors in.
pub(crate) async fn ensure_available<UR: UserRepository + ?Sized>(
    repository: &UR,
    username: Option<&Username>,
    email: Option<&EmailAddress>,
    owner: Option<&UserId>,
) -> Result<(), UserError> {
    if let Some(username) = username {
        if let Some(existing) = repository.find_by_username(username).await? {
            if Some(&existing.id) != owner {
                return Err(UserError::UsernameAlreadyExists(username.to_string()));
            }
        }
    }

    if let Some(email) = email {
        if let Some(existing) = repository.find_by_email(email).await? {
            if Some(&existing.id) != owner {
                return Err(UserError::EmailAlreadyExists(email.to_string()));
            }
        }
    }

    Ok(())
}

/// Build the stored form of a new user from a validated command.
pub(crate) fn new_credentials(command: CreateUserCommand, password_hash: String) -> UserCredentials {
    let now = Utc::now();
    UserCredentials {
        user: User {
            id: UserId::new(),
            username: command.username,
            full_name: command.full_name,
            email: command.email,
            role_id: command.role_id,
            active: command.active,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        },
        password_hash,
    }
}

#[async_trait]
impl<UR> UserServicePort for UserService<UR>
where
    UR: UserRepository,
{
    async fn create_user(&self, command: CreateUserCommand) -> Result<User, UserError> {
        ensure_available(
            self.repository.as_ref(),
            Some(&command.username),
            Some(&command.email),
            None,
        )
        .await?;

        let hasher = Arc::clone(&self.password_hasher);
        let password = command.password.expose().to_string();
        let password_hash = tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| UserError::PasswordHashing(e.to_string()))?
            .map_err(|e| UserError::PasswordHashing(e.to_string()))?;

        let created = self
            .repository
            .create(new_credentials(command, password_hash))
            .await?;

        tracing::info!(user_id = %created.id, username = %created.username, "User created");
        Ok(created)
    }

    async fn get_user(&self, id: &UserId) -> Result<User, UserError> {
        self.find_existing(id).await
    }

    async fn list_users(&self, request: &PageRequest) -> Result<Page<User>, UserError> {
        let slice = self.repository.list(request).await?;
        Ok(Page::from_slice(slice, request))
    }

    async fn update_user(
        &self,
        id: &UserId,
        command: UpdateUserCommand,
    ) -> Result<User, UserError> {
        let mut user = self.find_existing(id).await?;

        ensure_available(
            self.repository.as_ref(),
            command.username.as_ref(),
            command.email.as_ref(),
            Some(id),
        )
        .await?;

        if let Some(username) = command.username {
            user.username = username;
        }
        if let Some(full_name) = command.full_name {
            user.full_name = full_name;
        }
        if let Some(email) = command.email {
            user.email = email;
        }
        if let Some(role_id) = command.role_id {
            user.role_id = role_id;
        }
        if let Some(active) = command.active {
            user.active = active;
        }
        user.updated_at = Utc::now();

        self.repository.update(user).await
    }

    async fn delete_user(&self, id: &UserId) -> Result<(), UserError> {
        self.find_existing(id).await?;
        self.repository.delete(id).await?;

        tracing::info!(user_id = %id, "User deleted");
        Ok(())
    }
}
