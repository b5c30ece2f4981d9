use async_trait::async_trait;

use crate::domain::pagination::Page;
use crate::domain::pagination::PageRequest;
use crate::domain::pagination::PageSlice;
use crate::domain::role::errors::RoleError;
use crate::domain::role::models::CreateRoleCommand;
use crate::domain::role::models::Role;
use crate::domain::role::models::RoleId;
use crate::domain::role::models::RoleName;
use crate::domain::role::models::UpdateRoleCommand;

/// Port for role administration operations.
#[async_trait]
pub trait RoleServicePort: Send + Sync + 'static {
    /// Create a new role.
    ///
    /// # Errors
    /// * `NameAlreadyExists` - Role name is already taken
    /// * `DatabaseError` - Database operation failed
    async fn create_role(&self, command: CreateRoleCommand) -> Result<Role, RoleError>;

    /// # Errors
    /// * `NotFound` - Role does not exist
    async fn get_role(&self, id: &RoleId) -> Result<Role, RoleError>;

    /// List roles, newest first, optionally filtered by name/description.
    async fn list_roles(&self, request: &PageRequest) -> Result<Page<Role>, RoleError>;

    /// Update existing role with optional fields.
    ///
    /// # Errors
    /// * `NotFound` - Role does not exist
    /// * `NameAlreadyExists` - New name belongs to another role
    async fn update_role(&self, id: &RoleId, command: UpdateRoleCommand)
        -> Result<Role, RoleError>;

    /// Delete a role. Users holding it are left without a role.
    ///
    /// # Errors
    /// * `NotFound` - Role does not exist
    async fn delete_role(&self, id: &RoleId) -> Result<(), RoleError>;
}

/// Persistence operations for role aggregate.
#[async_trait]
pub trait RoleRepository: Send + Sync + 'static {
    /// # Errors
    /// * `NameAlreadyExists` - Unique constraint hit
    async fn create(&self, role: Role) -> Result<Role, RoleError>;

    async fn find_by_id(&self, id: &RoleId) -> Result<Option<Role>, RoleError>;

    async fn find_by_name(&self, name: &RoleName) -> Result<Option<Role>, RoleError>;

    async fn list(&self, request: &PageRequest) -> Result<PageSlice<Role>, RoleError>;

    /// # Errors
    /// * `NotFound` - Role does not exist
    /// * `NameAlreadyExists` - Unique constraint hit
    async fn update(&self, role: Role) -> Result<Role, RoleError>;

    /// # Errors
    /// * `NotFound` - Role does not exist
    async fn delete(&self, id: &RoleId) -> Result<(), RoleError>;
}
