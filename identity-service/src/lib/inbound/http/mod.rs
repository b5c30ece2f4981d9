pub mod client;
pub mod handlers;
pub mod middleware;
pub mod router;
