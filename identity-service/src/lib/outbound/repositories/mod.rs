pub mod health;
pub mod role;
pub mod session;
pub mod user;

pub use health::PostgresReadinessProbe;
pub use role::PostgresRoleRepository;
pub use session::PostgresSessionRepository;
pub use user::PostgresUserRepository;
