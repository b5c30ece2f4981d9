use std::sync::Arc;

use async_trait::async_trait;
use auth::AuthenticationError;
use auth::Authenticator;
use auth::IssuedToken;
use chrono::Utc;

use crate::domain::auth::errors::AuthError;
use crate::domain::auth::models::AuthOutcome;
use crate::domain::auth::models::AuthenticatedUser;
use crate::domain::auth::models::LoginCommand;
use crate::domain::auth::models::RegisterCommand;
use crate::domain::auth::ports::AuthServicePort;
use crate::domain::role::models::Permissions;
use crate::domain::role::models::Role;
use crate::domain::role::models::RoleId;
use crate::domain::role::models::RoleName;
use crate::domain::role::models::ADMIN_ROLE;
use crate::domain::role::ports::RoleRepository;
use crate::domain::session::models::ClientContext;
use crate::domain::session::models::Session;
use crate::domain::session::ports::SessionRepository;
use crate::domain::user::models::CreateUserCommand;
use crate::domain::user::models::Password;
use crate::domain::user::models::User;
use crate::domain::user::models::UserDraft;
use crate::domain::user::models::UserId;
use crate::domain::user::service::ensure_available;
use crate::domain::user::service::new_credentials;
use crate::domain::validation::ValidationErrors;
use crate::user::errors::UserError;
use crate::user::ports::UserRepository;

/// Authentication flow over the user, role and session stores.
pub struct AuthService<UR, RR, SR>
where
    UR: UserRepository,
    RR: RoleRepository,
    SR: SessionRepository,
{
    users: Arc<UR>,
    roles: Arc<RR>,
    sessions: Arc<SR>,
    authenticator: Arc<Authenticator>,
}

impl<UR, RR, SR> AuthService<UR, RR, SR>
where
    UR: UserRepository,
    RR: RoleRepository,
    SR: SessionRepository,
{
    pub fn new(
        users: Arc<UR>,
        roles: Arc<RR>,
        sessions: Arc<SR>,
        authenticator: Arc<Authenticator>,
    ) -> Self {
        Self {
            users,
            roles,
            sessions,
            authenticator,
        }
    }

    /// Persist a session for a freshly issued token and build the outcome.
    async fn open_session(
        &self,
        user: User,
        issued: IssuedToken,
        client: &ClientContext,
    ) -> Result<AuthOutcome, AuthError> {
        let expires_at = issued.expires_at();
        let session = Session::open(
            user.id,
            issued.access_token,
            client,
            Utc::now(),
            expires_at,
        );
        let session = self.sessions.create(session).await?;

        Ok(AuthOutcome {
            user,
            token: session.token,
            expires_at,
        })
    }

    async fn hash_password(&self, password: &Password) -> Result<String, AuthError> {
        let authenticator = Arc::clone(&self.authenticator);
        let password = password.expose().to_string();
        tokio::task::spawn_blocking(move || authenticator.hash_password(&password))
            .await
            .map_err(|e| AuthError::PasswordHashing(e.to_string()))?
            .map_err(|e| AuthError::PasswordHashing(e.to_string()))
    }

    /// The `admin` role, created when the store has none.
    async fn admin_role(&self) -> Result<Role, AuthError> {
        let name = RoleName::new(ADMIN_ROLE.to_string()).map_err(|e| {
            let mut errors = ValidationErrors::new();
            errors.add("name", e);
            AuthError::Validation(errors)
        })?;
        if let Some(role) = self.roles.find_by_name(&name).await? {
            if !role.active {
                tracing::warn!(role_id = %role.id, "Admin role is inactive");
            }
            return Ok(role);
        }

        let now = Utc::now();
        let role = Role {
            id: RoleId::new(),
            name,
            description: Some("System administrator".to_string()),
            permissions: Permissions::Flags([("all".to_string(), true)].into()),
            active: true,
            created_at: now,
            updated_at: now,
        };
        let role = self.roles.create(role).await?;
        tracing::info!(role_id = %role.id, "Admin role created");
        Ok(role)
    }

    /// Create the administrator account described by `draft` unless a user
    /// already holds its email.
    ///
    /// The account gets the `admin` role and is active whatever the draft
    /// says. Returns the new user, or `None` when nothing was created.
    ///
    /// # Errors
    /// * `Validation` - Draft fields violate the user rules
    /// * `User` - Username taken by another account, or store failure
    pub async fn bootstrap_admin(&self, draft: UserDraft) -> Result<Option<User>, AuthError> {
        let mut command = CreateUserCommand::try_from(draft)?;

        if let Some(existing) = self.users.find_by_email(&command.email).await? {
            tracing::info!(user_id = %existing.id, "Bootstrap admin already present");
            return Ok(None);
        }
        ensure_available(self.users.as_ref(), Some(&command.username), None, None).await?;

        let role = self.admin_role().await?;
        command.role_id = Some(role.id);
        command.active = true;

        let password_hash = self.hash_password(&command.password).await?;
        let user = self
            .users
            .create(new_credentials(command, password_hash))
            .await?;

        tracing::info!(user_id = %user.id, username = %user.username, "Bootstrap admin created");
        Ok(Some(user))
    }

    /// Name of the user's role when it exists and is active.
    async fn resolve_role_name(
        &self,
        role_id: Option<&RoleId>,
    ) -> Result<Option<String>, AuthError> {
        let Some(role_id) = role_id else {
            return Ok(None);
        };

        let role = self.roles.find_by_id(role_id).await?;
        Ok(role
            .filter(|role| role.active)
            .map(|role| role.name.as_str().to_string()))
    }
}

#[async_trait]
impl<UR, RR, SR> AuthServicePort for AuthService<UR, RR, SR>
where
    UR: UserRepository,
    RR: RoleRepository,
    SR: SessionRepository,
{
    async fn register(
        &self,
        command: RegisterCommand,
        client: &ClientContext,
    ) -> Result<AuthOutcome, AuthError> {
        ensure_available(
            self.users.as_ref(),
            Some(&command.username),
            Some(&command.email),
            None,
        )
        .await?;

        let password_hash = self.hash_password(&command.password).await?;

        let user = self
            .users
            .create(new_credentials(CreateUserCommand::from(command), password_hash))
            .await?;

        let issued = self
            .authenticator
            .issue_token(&user.id.to_string(), user.email.as_str(), None)
            .map_err(|e| AuthError::TokenIssuing(e.to_string()))?;

        tracing::info!(user_id = %user.id, username = %user.username, "User registered");
        self.open_session(user, issued, client).await
    }

    async fn login(
        &self,
        command: LoginCommand,
        client: &ClientContext,
    ) -> Result<AuthOutcome, AuthError> {
        let credentials = self
            .users
            .find_credentials_by_email(&command.email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !credentials.user.active {
            tracing::warn!(user_id = %credentials.user.id, "Login attempt on inactive account");
            return Err(AuthError::AccountInactive);
        }

        let mut user = credentials.user;
        let authenticator = Arc::clone(&self.authenticator);
        let password_hash = credentials.password_hash;
        let subject = user.id.to_string();
        let email = user.email.as_str().to_string();
        let role = user.role_id.map(|id| id.to_string());
        let issued = tokio::task::spawn_blocking(move || {
            authenticator.authenticate(&command.password, &password_hash, &subject, &email, role)
        })
        .await
        .map_err(|e| AuthError::PasswordHashing(e.to_string()))?
        .map_err(|e| match e {
            AuthenticationError::InvalidCredentials => AuthError::InvalidCredentials,
            AuthenticationError::PasswordError(e) => AuthError::PasswordHashing(e.to_string()),
            AuthenticationError::JwtError(e) => AuthError::TokenIssuing(e.to_string()),
        })?;

        let now = Utc::now();
        self.users.record_login(&user.id, now).await?;
        user.last_login_at = Some(now);

        tracing::info!(user_id = %user.id, "User logged in");
        self.open_session(user, issued, client).await
    }

    async fn logout(&self, user_id: &UserId, token: &str) -> Result<(), AuthError> {
        let removed = self.sessions.delete(user_id, token).await?;
        tracing::info!(user_id = %user_id, removed, "User logged out");
        Ok(())
    }

    async fn profile(&self, user_id: &UserId) -> Result<User, AuthError> {
        self.users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AuthError::User(UserError::NotFound(user_id.to_string())))
    }

    async fn authorize(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
        let claims = self.authenticator.validate_token(token).map_err(|e| {
            tracing::warn!(error = %e, "Rejected bearer token");
            AuthError::InvalidToken
        })?;
        let user_id = UserId::from_string(&claims.sub).map_err(|_| AuthError::InvalidToken)?;

        let now = Utc::now();
        let session = self
            .sessions
            .find_valid(&user_id, token, now)
            .await?
            .ok_or_else(|| {
                tracing::warn!(user_id = %user_id, "No valid session for token");
                AuthError::InvalidSession
            })?;

        let user = self
            .users
            .find_by_id(&user_id)
            .await?
            .filter(|user| user.active)
            .ok_or(AuthError::UserUnavailable)?;

        let role_name = self.resolve_role_name(user.role_id.as_ref()).await?;

        if let Err(e) = self.sessions.touch(&session.id, now).await {
            tracing::warn!(session_id = %session.id, error = %e, "Failed to refresh session activity");
        }

        Ok(AuthenticatedUser {
            user_id: user.id,
            email: user.email.as_str().to_string(),
            role_id: user.role_id,
            role_name,
            token: token.to_string(),
        })
    }
}
