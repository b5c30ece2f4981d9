use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum HealthError {
    #[error("Database unreachable: {0}")]
    DatabaseUnreachable(String),
}

/// Reports whether the backing store can serve queries.
#[async_trait]
pub trait ReadinessProbe: Send + Sync + 'static {
    async fn check(&self) -> Result<(), HealthError>;
}
