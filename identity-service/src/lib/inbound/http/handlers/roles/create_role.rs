use axum::extract::State;
use axum::http::StatusCode;
use serde::Deserialize;

use super::RoleData;
use crate::domain::role::errors::RoleError;
use crate::domain::role::models::CreateRoleCommand;
use crate::domain::role::models::Permissions;
use crate::domain::role::models::RoleDraft;
use crate::domain::role::ports::RoleServicePort;
use crate::inbound::http::handlers::ApiError;
use crate::inbound::http::handlers::ApiSuccess;
use crate::inbound::http::handlers::JsonBody;
use crate::inbound::http::router::AppState;

pub async fn create_role(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<CreateRoleRequest>,
) -> Result<ApiSuccess<RoleData>, ApiError> {
    let command = CreateRoleCommand::try_from(RoleDraft::from(body)).map_err(RoleError::from)?;

    state
        .role_service
        .create_role(command)
        .await
        .map_err(ApiError::from)
        .map(|role| ApiSuccess::new(StatusCode::CREATED, role.into()))
}

/// HTTP request body for creating a role (raw JSON)
///
/// `permissions` is either an object of booleans or an array of names.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CreateRoleRequest {
    name: String,
    description: Option<String>,
    permissions: Option<Permissions>,
    active: Option<bool>,
}

impl From<CreateRoleRequest> for RoleDraft {
    fn from(req: CreateRoleRequest) -> Self {
        RoleDraft {
            name: req.name,
            description: req.description,
            permissions: req.permissions,
            active: req.active,
        }
    }
}
