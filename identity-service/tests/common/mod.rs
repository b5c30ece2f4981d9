#![allow(dead_code)]

pub mod postgres;

use std::net::SocketAddr;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;
use auth::Authenticator;
use auth::PasswordHasher;
use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;
use identity_service::config::RunMode;
use identity_service::domain::auth::service::AuthService;
use identity_service::domain::health::HealthError;
use identity_service::domain::health::ReadinessProbe;
use identity_service::domain::pagination::PageRequest;
use identity_service::domain::pagination::PageSlice;
use identity_service::inbound::http::router::create_router;
use identity_service::inbound::http::router::AppState;
use identity_service::role::errors::RoleError;
use identity_service::role::models::Permissions;
use identity_service::role::models::Role;
use identity_service::role::models::RoleId;
use identity_service::role::models::RoleName;
use identity_service::role::ports::RoleRepository;
use identity_service::role::service::RoleService;
use identity_service::session::errors::SessionError;
use identity_service::session::models::Session;
use identity_service::session::models::SessionId;
use identity_service::session::ports::SessionRepository;
use identity_service::user::errors::UserError;
use identity_service::user::models::EmailAddress;
use identity_service::user::models::User;
use identity_service::user::models::UserCredentials;
use identity_service::user::models::UserDraft;
use identity_service::user::models::UserId;
use identity_service::user::models::Username;
use identity_service::user::ports::UserRepository;
use identity_service::user::service::UserService;
use serde_json::json;
use serde_json::Value;

pub const JWT_SECRET: &[u8] = b"test-secret-key-for-jwt-signing-at-least-32-bytes";

/// Account created by the startup bootstrap of every `TestApp`.
pub const ADMIN_EMAIL: &str = "admin@example.com";
pub const ADMIN_PASSWORD: &str = "admin-secret";

/// Rows shared by the in-memory repositories, mirroring the relational
/// constraints of the real schema.
#[derive(Default)]
pub struct MemoryDb {
    users: Mutex<Vec<UserCredentials>>,
    roles: Mutex<Vec<Role>>,
    sessions: Mutex<Vec<Session>>,
    unreachable: AtomicBool,
}

impl MemoryDb {
    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::SeqCst);
    }

    pub fn sessions_for(&self, user_id: &UserId) -> Vec<Session> {
        self.sessions
            .lock()
            .unwrap()
            .iter()
            .filter(|s| &s.user_id == user_id)
            .cloned()
            .collect()
    }

    /// Move every session of `user_id` into the past.
    pub fn expire_sessions(&self, user_id: &UserId) {
        let past = Utc::now() - Duration::seconds(1);
        for session in self.sessions.lock().unwrap().iter_mut() {
            if &session.user_id == user_id {
                session.expires_at = past;
            }
        }
    }

    pub fn insert_role(&self, name: &str) -> RoleId {
        let now = Utc::now();
        let role = Role {
            id: RoleId::new(),
            name: RoleName::new(name.to_string()).unwrap(),
            description: None,
            permissions: Permissions::default(),
            active: true,
            created_at: now,
            updated_at: now,
        };
        let id = role.id;
        self.roles.lock().unwrap().push(role);
        id
    }

    pub fn assign_role(&self, user_id: &UserId, role_id: Option<RoleId>) {
        let mut users = self.users.lock().unwrap();
        let row = users
            .iter_mut()
            .find(|c| &c.user.id == user_id)
            .expect("user not found");
        row.user.role_id = role_id;
    }

    pub fn set_active(&self, user_id: &UserId, active: bool) {
        let mut users = self.users.lock().unwrap();
        let row = users
            .iter_mut()
            .find(|c| &c.user.id == user_id)
            .expect("user not found");
        row.user.active = active;
    }

    fn user_conflict(users: &[UserCredentials], user: &User) -> Result<(), UserError> {
        let others = users.iter().filter(|c| c.user.id != user.id);
        for other in others {
            if other.user.username == user.username {
                return Err(UserError::UsernameAlreadyExists(
                    user.username.as_str().to_string(),
                ));
            }
            if other.user.email == user.email {
                return Err(UserError::EmailAlreadyExists(user.email.as_str().to_string()));
            }
        }
        Ok(())
    }

    fn check_role_reference(&self, role_id: Option<&RoleId>) -> Result<(), UserError> {
        match role_id {
            Some(id) if !self.roles.lock().unwrap().iter().any(|r| &r.id == id) => {
                Err(UserError::UnknownRole(id.to_string()))
            }
            _ => Ok(()),
        }
    }
}

/// `ORDER BY created_at DESC, id DESC`
fn newest_first<T>(rows: &mut [T], key: impl Fn(&T) -> (DateTime<Utc>, u128)) {
    rows.sort_by(|a, b| key(b).cmp(&key(a)));
}

pub struct MemoryUserRepository(pub Arc<MemoryDb>);

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn create(&self, credentials: UserCredentials) -> Result<User, UserError> {
        self.0.check_role_reference(credentials.user.role_id.as_ref())?;
        let mut users = self.0.users.lock().unwrap();
        MemoryDb::user_conflict(&users, &credentials.user)?;
        let user = credentials.user.clone();
        users.push(credentials);
        Ok(user)
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserError> {
        let users = self.0.users.lock().unwrap();
        Ok(users.iter().find(|c| &c.user.id == id).map(|c| c.user.clone()))
    }

    async fn find_by_username(&self, username: &Username) -> Result<Option<User>, UserError> {
        let users = self.0.users.lock().unwrap();
        Ok(users
            .iter()
            .find(|c| &c.user.username == username)
            .map(|c| c.user.clone()))
    }

    async fn find_by_email(&self, email: &EmailAddress) -> Result<Option<User>, UserError> {
        let users = self.0.users.lock().unwrap();
        Ok(users
            .iter()
            .find(|c| &c.user.email == email)
            .map(|c| c.user.clone()))
    }

    async fn find_credentials_by_email(
        &self,
        email: &str,
    ) -> Result<Option<UserCredentials>, UserError> {
        let users = self.0.users.lock().unwrap();
        Ok(users.iter().find(|c| c.user.email.as_str() == email).cloned())
    }

    async fn list(&self, request: &PageRequest) -> Result<PageSlice<User>, UserError> {
        let users = self.0.users.lock().unwrap();
        let mut matching: Vec<User> = users
            .iter()
            .map(|c| c.user.clone())
            .filter(|u| {
                request.matches(&[u.username.as_str(), u.email.as_str(), u.full_name.as_str()])
            })
            .collect();
        newest_first(&mut matching, |u| (u.created_at, u.id.0.as_u128()));

        Ok(PageSlice {
            total: matching.len() as u64,
            items: matching
                .into_iter()
                .skip(request.offset() as usize)
                .take(request.limit() as usize)
                .collect(),
        })
    }

    async fn update(&self, user: User) -> Result<User, UserError> {
        self.0.check_role_reference(user.role_id.as_ref())?;
        let mut users = self.0.users.lock().unwrap();
        MemoryDb::user_conflict(&users, &user)?;
        let row = users
            .iter_mut()
            .find(|c| c.user.id == user.id)
            .ok_or_else(|| UserError::NotFound(user.id.to_string()))?;
        row.user = user.clone();
        Ok(user)
    }

    async fn record_login(&self, id: &UserId, at: DateTime<Utc>) -> Result<(), UserError> {
        let mut users = self.0.users.lock().unwrap();
        if let Some(row) = users.iter_mut().find(|c| &c.user.id == id) {
            row.user.last_login_at = Some(at);
        }
        Ok(())
    }

    async fn delete(&self, id: &UserId) -> Result<(), UserError> {
        let mut users = self.0.users.lock().unwrap();
        let before = users.len();
        users.retain(|c| &c.user.id != id);
        if users.len() == before {
            return Err(UserError::NotFound(id.to_string()));
        }
        self.0.sessions.lock().unwrap().retain(|s| &s.user_id != id);
        Ok(())
    }
}

pub struct MemoryRoleRepository(pub Arc<MemoryDb>);

impl MemoryRoleRepository {
    fn name_conflict(roles: &[Role], role: &Role) -> Result<(), RoleError> {
        if roles.iter().any(|r| r.id != role.id && r.name == role.name) {
            return Err(RoleError::NameAlreadyExists(role.name.as_str().to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl RoleRepository for MemoryRoleRepository {
    async fn create(&self, role: Role) -> Result<Role, RoleError> {
        let mut roles = self.0.roles.lock().unwrap();
        Self::name_conflict(&roles, &role)?;
        roles.push(role.clone());
        Ok(role)
    }

    async fn find_by_id(&self, id: &RoleId) -> Result<Option<Role>, RoleError> {
        let roles = self.0.roles.lock().unwrap();
        Ok(roles.iter().find(|r| &r.id == id).cloned())
    }

    async fn find_by_name(&self, name: &RoleName) -> Result<Option<Role>, RoleError> {
        let roles = self.0.roles.lock().unwrap();
        Ok(roles.iter().find(|r| &r.name == name).cloned())
    }

    async fn list(&self, request: &PageRequest) -> Result<PageSlice<Role>, RoleError> {
        let roles = self.0.roles.lock().unwrap();
        let mut matching: Vec<Role> = roles
            .iter()
            .filter(|r| {
                request.matches(&[r.name.as_str(), r.description.as_deref().unwrap_or("")])
            })
            .cloned()
            .collect();
        newest_first(&mut matching, |r| (r.created_at, r.id.0.as_u128()));

        Ok(PageSlice {
            total: matching.len() as u64,
            items: matching
                .into_iter()
                .skip(request.offset() as usize)
                .take(request.limit() as usize)
                .collect(),
        })
    }

    async fn update(&self, role: Role) -> Result<Role, RoleError> {
        let mut roles = self.0.roles.lock().unwrap();
        Self::name_conflict(&roles, &role)?;
        let row = roles
            .iter_mut()
            .find(|r| r.id == role.id)
            .ok_or_else(|| RoleError::NotFound(role.id.to_string()))?;
        *row = role.clone();
        Ok(role)
    }

    async fn delete(&self, id: &RoleId) -> Result<(), RoleError> {
        let mut roles = self.0.roles.lock().unwrap();
        let before = roles.len();
        roles.retain(|r| &r.id != id);
        if roles.len() == before {
            return Err(RoleError::NotFound(id.to_string()));
        }
        for row in self.0.users.lock().unwrap().iter_mut() {
            if row.user.role_id.as_ref() == Some(id) {
                row.user.role_id = None;
            }
        }
        Ok(())
    }
}

pub struct MemorySessionRepository(pub Arc<MemoryDb>);

#[async_trait]
impl SessionRepository for MemorySessionRepository {
    async fn create(&self, session: Session) -> Result<Session, SessionError> {
        let mut sessions = self.0.sessions.lock().unwrap();
        if sessions.iter().any(|s| s.token == session.token) {
            return Err(SessionError::DuplicateToken);
        }
        sessions.push(session.clone());
        Ok(session)
    }

    async fn find_valid(
        &self,
        user_id: &UserId,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Session>, SessionError> {
        let sessions = self.0.sessions.lock().unwrap();
        Ok(sessions
            .iter()
            .find(|s| &s.user_id == user_id && s.token == token && s.is_valid_at(now))
            .cloned())
    }

    async fn touch(&self, id: &SessionId, at: DateTime<Utc>) -> Result<(), SessionError> {
        let mut sessions = self.0.sessions.lock().unwrap();
        if let Some(session) = sessions.iter_mut().find(|s| &s.id == id) {
            session.last_activity_at = at;
        }
        Ok(())
    }

    async fn delete(&self, user_id: &UserId, token: &str) -> Result<bool, SessionError> {
        let mut sessions = self.0.sessions.lock().unwrap();
        let before = sessions.len();
        sessions.retain(|s| !(&s.user_id == user_id && s.token == token));
        Ok(sessions.len() < before)
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, SessionError> {
        let mut sessions = self.0.sessions.lock().unwrap();
        let before = sessions.len();
        sessions.retain(|s| s.is_valid_at(now));
        Ok((before - sessions.len()) as u64)
    }
}

pub struct MemoryReadinessProbe(pub Arc<MemoryDb>);

#[async_trait]
impl ReadinessProbe for MemoryReadinessProbe {
    async fn check(&self) -> Result<(), HealthError> {
        if self.0.unreachable.load(Ordering::SeqCst) {
            return Err(HealthError::DatabaseUnreachable(
                "connection refused".to_string(),
            ));
        }
        Ok(())
    }
}

/// Test application that spawns a real server over in-memory stores
pub struct TestApp {
    pub address: String,
    pub db: Arc<MemoryDb>,
    pub api_client: reqwest::Client,
    pub authenticator: Arc<Authenticator>,
}

/// A registered account and the token of its first session.
pub struct TestUser {
    pub id: UserId,
    pub email: String,
    pub password: String,
    pub token: String,
}

fn fast_hasher() -> PasswordHasher {
    PasswordHasher::with_cost(8 * 1024, 1, 1).expect("Invalid hasher parameters")
}

impl TestApp {
    /// Spawn the application in a background task and return TestApp
    pub async fn spawn() -> Self {
        Self::spawn_with_ttl(Duration::days(7)).await
    }

    /// Spawn with a custom token lifetime.
    pub async fn spawn_with_ttl(token_ttl: Duration) -> Self {
        let db = Arc::new(MemoryDb::default());

        // Use random port (0 = OS assigns)
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind random port");
        let port = listener.local_addr().unwrap().port();
        let address = format!("http://127.0.0.1:{}", port);

        let users = Arc::new(MemoryUserRepository(Arc::clone(&db)));
        let roles = Arc::new(MemoryRoleRepository(Arc::clone(&db)));
        let sessions = Arc::new(MemorySessionRepository(Arc::clone(&db)));

        let authenticator = Arc::new(
            Authenticator::new(JWT_SECRET, token_ttl)
                .expect("Failed to create authenticator")
                .with_password_hasher(fast_hasher()),
        );

        let auth_service = Arc::new(AuthService::new(
            Arc::clone(&users),
            Arc::clone(&roles),
            sessions,
            Arc::clone(&authenticator),
        ));
        auth_service
            .bootstrap_admin(UserDraft {
                username: "admin".to_string(),
                full_name: "Administrator".to_string(),
                email: ADMIN_EMAIL.to_string(),
                password: ADMIN_PASSWORD.to_string(),
                role_id: None,
                active: None,
            })
            .await
            .expect("Failed to bootstrap admin");

        let state = AppState::new(
            auth_service,
            Arc::new(UserService::new(users).with_password_hasher(fast_hasher())),
            Arc::new(RoleService::new(roles)),
            Arc::new(MemoryReadinessProbe(Arc::clone(&db))),
            RunMode::Test,
        );
        let router = create_router(state);

        // Spawn server in background
        tokio::spawn(async move {
            axum::serve(
                listener,
                router.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .await
            .expect("Server error");
        });

        Self {
            address,
            db,
            api_client: reqwest::Client::new(),
            authenticator,
        }
    }

    /// Helper to make GET request
    pub fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.get(format!("{}{}", self.address, path))
    }

    /// Helper to make POST request
    pub fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.post(format!("{}{}", self.address, path))
    }

    /// Helper to make GET request with Bearer token
    pub fn get_authenticated(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.get(path).bearer_auth(token)
    }

    /// Helper to make POST request with Bearer token
    pub fn post_authenticated(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.post(path).bearer_auth(token)
    }

    /// Helper to make PUT request with Bearer token
    pub fn put_authenticated(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.api_client
            .put(format!("{}{}", self.address, path))
            .bearer_auth(token)
    }

    /// Helper to make DELETE request with Bearer token
    pub fn delete_authenticated(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.api_client
            .delete(format!("{}{}", self.address, path))
            .bearer_auth(token)
    }

    /// Register an account through the API.
    pub async fn register(&self, username: &str, email: &str) -> TestUser {
        let password = "secret1".to_string();
        let response = self
            .post("/api/v1/auth/register")
            .json(&json!({
                "username": username,
                "fullName": format!("{} Test", username),
                "email": email,
                "password": password,
            }))
            .send()
            .await
            .expect("Failed to execute request");
        assert_eq!(response.status(), reqwest::StatusCode::CREATED);

        let body: Value = response.json().await.expect("Failed to parse response");
        TestUser {
            id: UserId::from_string(body["data"]["user"]["id"].as_str().unwrap()).unwrap(),
            email: email.to_string(),
            password,
            token: body["data"]["token"].as_str().unwrap().to_string(),
        }
    }

    /// Log in as the bootstrap administrator.
    pub async fn login_admin(&self) -> TestUser {
        self.login(ADMIN_EMAIL, ADMIN_PASSWORD).await
    }

    /// Open a new session for an existing account.
    pub async fn login(&self, email: &str, password: &str) -> TestUser {
        let response = self
            .post("/api/v1/auth/login")
            .json(&json!({"email": email, "password": password}))
            .send()
            .await
            .expect("Failed to execute request");
        assert_eq!(response.status(), reqwest::StatusCode::OK);

        let body: Value = response.json().await.expect("Failed to parse response");
        TestUser {
            id: UserId::from_string(body["data"]["user"]["id"].as_str().unwrap()).unwrap(),
            email: email.to_string(),
            password: password.to_string(),
            token: body["data"]["token"].as_str().unwrap().to_string(),
        }
    }
}
