use chrono::DateTime;
use chrono::Utc;
use serde::Serialize;

use crate::domain::role::models::Permissions;
use crate::domain::role::models::Role;

pub mod create_role;
pub mod delete_role;
pub mod get_role;
pub mod list_roles;
pub mod update_role;

pub use create_role::create_role;
pub use delete_role::delete_role;
pub use get_role::get_role;
pub use list_roles::list_roles;
pub use update_role::update_role;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleData {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub permissions: Permissions,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Role> for RoleData {
    fn from(role: Role) -> Self {
        Self {
            id: role.id.to_string(),
            name: role.name.as_str().to_string(),
            description: role.description,
            permissions: role.permissions,
            active: role.active,
            created_at: role.created_at,
            updated_at: role.updated_at,
        }
    }
}
