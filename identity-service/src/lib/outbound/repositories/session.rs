use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use sqlx::PgPool;
use sqlx::Row;

use crate::domain::session::errors::SessionError;
use crate::domain::session::models::Session;
use crate::domain::session::models::SessionId;
use crate::domain::session::ports::SessionRepository;
use crate::domain::user::models::UserId;

pub struct PostgresSessionRepository {
    pool: PgPool,
}

impl PostgresSessionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionRepository for PostgresSessionRepository {
    async fn create(&self, session: Session) -> Result<Session, SessionError> {
        sqlx::query(
            r#"
            INSERT INTO sessions (id, user_id, token, ip_address, user_agent, device_info,
                                  created_at, last_activity_at, expires_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(session.id.0)
        .bind(session.user_id.0)
        .bind(&session.token)
        .bind(session.ip_address.as_deref())
        .bind(session.user_agent.as_deref())
        .bind(&session.device_info)
        .bind(session.created_at)
        .bind(session.last_activity_at)
        .bind(session.expires_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match e.as_database_error() {
            Some(db_err) if db_err.is_unique_violation() => SessionError::DuplicateToken,
            _ => SessionError::DatabaseError(e.to_string()),
        })?;

        Ok(session)
    }

    async fn find_valid(
        &self,
        user_id: &UserId,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Session>, SessionError> {
        let row = sqlx::query(
            r#"
            SELECT id, user_id, token, ip_address, user_agent, device_info,
                   created_at, last_activity_at, expires_at
            FROM sessions
            WHERE user_id = $1 AND token = $2 AND expires_at > $3
            "#,
        )
        .bind(user_id.0)
        .bind(token)
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| SessionError::DatabaseError(e.to_string()))?;

        Ok(row.map(|r| Session {
            id: SessionId(r.get("id")),
            user_id: UserId(r.get("user_id")),
            token: r.get("token"),
            ip_address: r.get("ip_address"),
            user_agent: r.get("user_agent"),
            device_info: r.get("device_info"),
            created_at: r.get("created_at"),
            last_activity_at: r.get("last_activity_at"),
            expires_at: r.get("expires_at"),
        }))
    }

    async fn touch(&self, id: &SessionId, at: DateTime<Utc>) -> Result<(), SessionError> {
        sqlx::query("UPDATE sessions SET last_activity_at = $2 WHERE id = $1")
            .bind(id.0)
            .bind(at)
            .execute(&self.pool)
            .await
            .map_err(|e| SessionError::DatabaseError(e.to_string()))?;

        Ok(())
    }

    async fn delete(&self, user_id: &UserId, token: &str) -> Result<bool, SessionError> {
        let result = sqlx::query("DELETE FROM sessions WHERE user_id = $1 AND token = $2")
            .bind(user_id.0)
            .bind(token)
            .execute(&self.pool)
            .await
            .map_err(|e| SessionError::DatabaseError(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, SessionError> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= $1")
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(|e| SessionError::DatabaseError(e.to_string()))?;

        Ok(result.rows_affected())
    }
}
