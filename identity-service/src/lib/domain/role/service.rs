use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use crate::domain::pagination::Page;
use crate::domain::pagination::PageRequest;
use crate::domain::role::errors::RoleError;
use crate::domain::role::models::CreateRoleCommand;
use crate::domain::role::models::Role;
use crate::domain::role::models::RoleId;
use crate::domain::role::models::RoleName;
use crate::domain::role::models::UpdateRoleCommand;
use crate::domain::role::ports::RoleRepository;
use crate::domain::role::ports::RoleServicePort;

/// Domain service implementation for role administration.
pub struct RoleService<RR>
where
    RR: RoleRepository,
{
    repository: Arc<RR>,
}

impl<RR> RoleService<RR>
where
    RR: RoleRepository,
{
    pub fn new(repository: Arc<RR>) -> Self {
        Self { repository }
    }

    async fn find_existing(&self, id: &RoleId) -> Result<Role, RoleError> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| RoleError::NotFound(id.to_string()))
    }

    async fn ensure_name_available(
        &self,
        name: &RoleName,
        owner: Option<&RoleId>,
    ) -> Result<(), RoleError> {
        match self.repository.find_by_name(name).await? {
            Some(existing) if Some(&existing.id) != owner => {
                Err(RoleError::NameAlreadyExists(name.to_string()))
            }
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl<RR> RoleServicePort for RoleService<RR>
where
    RR: RoleRepository,
{
    async fn create_role(&self, command: CreateRoleCommand) -> Result<Role, RoleError> {
        self.ensure_name_available(&command.name, None).await?;

        let now = Utc::now();
        let role = Role {
            id: RoleId::new(),
            name: command.name,
            description: command.description,
            permissions: command.permissions,
            active: command.active,
            created_at: now,
            updated_at: now,
        };

        let created = self.repository.create(role).await?;

        tracing::info!(role_id = %created.id, name = %created.name, "Role created");
        Ok(created)
    }

    async fn get_role(&self, id: &RoleId) -> Result<Role, RoleError> {
        self.find_existing(id).await
    }

    async fn list_roles(&self, request: &PageRequest) -> Result<Page<Role>, RoleError> {
        let slice = self.repository.list(request).await?;
        Ok(Page::from_slice(slice, request))
    }

    async fn update_role(
        &self,
        id: &RoleId,
        command: UpdateRoleCommand,
    ) -> Result<Role, RoleError> {
        let mut role = self.find_existing(id).await?;

        if let Some(name) = &command.name {
            self.ensure_name_available(name, Some(id)).await?;
        }

        if let Some(name) = command.name {
            role.name = name;
        }
        if let Some(description) = command.description {
            role.description = description;
        }
        if let Some(permissions) = command.permissions {
            role.permissions = permissions;
        }
        if let Some(active) = command.active {
            role.active = active;
        }
        role.updated_at = Utc::now();

        self.repository.update(role).await
    }

    async fn delete_role(&self, id: &RoleId) -> Result<(), RoleError> {
        self.find_existing(id).await?;
        self.repository.delete(id).await?;

        tracing::info!(role_id = %id, "Role deleted");
        Ok(())
    }
}
