use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::health::HealthError;
use crate::domain::health::ReadinessProbe;

pub struct PostgresReadinessProbe {
    pool: PgPool,
}

impl PostgresReadinessProbe {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReadinessProbe for PostgresReadinessProbe {
    async fn check(&self) -> Result<(), HealthError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| HealthError::DatabaseUnreachable(e.to_string()))?;

        Ok(())
    }
}
