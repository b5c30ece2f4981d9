pub mod auth;
pub mod health;
pub mod pagination;
pub mod role;
pub mod session;
pub mod user;
pub mod validation;
