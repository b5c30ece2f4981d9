use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::types::Json;
use sqlx::PgPool;
use sqlx::Row;

use crate::domain::pagination::PageRequest;
use crate::domain::pagination::PageSlice;
use crate::domain::role::errors::RoleError;
use crate::domain::role::models::Permissions;
use crate::domain::role::models::Role;
use crate::domain::role::models::RoleId;
use crate::domain::role::models::RoleName;
use crate::domain::role::ports::RoleRepository;

const ROLE_COLUMNS: &str = "id, name, description, permissions, active, created_at, updated_at";

const SEARCH_CLAUSE: &str = "($1::text IS NULL OR name ILIKE $1 OR description ILIKE $1)";

pub struct PostgresRoleRepository {
    pool: PgPool,
}

impl PostgresRoleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_role(row: &PgRow) -> Result<Role, RoleError> {
        let name = RoleName::new(row.get("name"))
            .map_err(|e| RoleError::DatabaseError(format!("Stored role is invalid: {}", e)))?;
        let Json(permissions) = row.get::<Json<Permissions>, _>("permissions");

        Ok(Role {
            id: RoleId(row.get("id")),
            name,
            description: row.get("description"),
            permissions,
            active: row.get("active"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        })
    }

    fn map_write_error(e: sqlx::Error, role: &Role) -> RoleError {
        if let Some(db_err) = e.as_database_error() {
            if db_err.is_unique_violation() && db_err.constraint() == Some("roles_name_key") {
                return RoleError::NameAlreadyExists(role.name.to_string());
            }
        }
        RoleError::DatabaseError(e.to_string())
    }
}

#[async_trait]
impl RoleRepository for PostgresRoleRepository {
    async fn create(&self, role: Role) -> Result<Role, RoleError> {
        sqlx::query(
            r#"
            INSERT INTO roles (id, name, description, permissions, active, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(role.id.0)
        .bind(role.name.as_str())
        .bind(role.description.as_deref())
        .bind(Json(&role.permissions))
        .bind(role.active)
        .bind(role.created_at)
        .bind(role.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| Self::map_write_error(e, &role))?;

        Ok(role)
    }

    async fn find_by_id(&self, id: &RoleId) -> Result<Option<Role>, RoleError> {
        let row = sqlx::query(&format!("SELECT {} FROM roles WHERE id = $1", ROLE_COLUMNS))
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RoleError::DatabaseError(e.to_string()))?;

        row.as_ref().map(Self::row_to_role).transpose()
    }

    async fn find_by_name(&self, name: &RoleName) -> Result<Option<Role>, RoleError> {
        let row = sqlx::query(&format!("SELECT {} FROM roles WHERE name = $1", ROLE_COLUMNS))
            .bind(name.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RoleError::DatabaseError(e.to_string()))?;

        row.as_ref().map(Self::row_to_role).transpose()
    }

    async fn list(&self, request: &PageRequest) -> Result<PageSlice<Role>, RoleError> {
        let pattern = request.search_pattern();

        let total: i64 = sqlx::query(&format!(
            "SELECT COUNT(*) AS total FROM roles WHERE {}",
            SEARCH_CLAUSE
        ))
        .bind(&pattern)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| RoleError::DatabaseError(e.to_string()))?
        .get("total");

        let rows = sqlx::query(&format!(
            "SELECT {} FROM roles WHERE {} ORDER BY created_at DESC, id DESC LIMIT $2 OFFSET $3",
            ROLE_COLUMNS, SEARCH_CLAUSE
        ))
        .bind(&pattern)
        .bind(request.limit() as i64)
        .bind(request.offset() as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RoleError::DatabaseError(e.to_string()))?;

        let items = rows
            .iter()
            .map(Self::row_to_role)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(PageSlice {
            items,
            total: total as u64,
        })
    }

    async fn update(&self, role: Role) -> Result<Role, RoleError> {
        let result = sqlx::query(
            r#"
            UPDATE roles
            SET name = $2, description = $3, permissions = $4, active = $5, updated_at = $6
            WHERE id = $1
            "#,
        )
        .bind(role.id.0)
        .bind(role.name.as_str())
        .bind(role.description.as_deref())
        .bind(Json(&role.permissions))
        .bind(role.active)
        .bind(role.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| Self::map_write_error(e, &role))?;

        if result.rows_affected() == 0 {
            return Err(RoleError::NotFound(role.id.to_string()));
        }

        Ok(role)
    }

    async fn delete(&self, id: &RoleId) -> Result<(), RoleError> {
        let result = sqlx::query("DELETE FROM roles WHERE id = $1")
            .bind(id.0)
            .execute(&self.pool)
            .await
            .map_err(|e| RoleError::DatabaseError(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RoleError::NotFound(id.to_string()));
        }

        Ok(())
    }
}
