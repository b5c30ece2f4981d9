use axum::extract::Path;
use axum::extract::State;
use axum::http::StatusCode;
use serde::Deserialize;

use super::RoleData;
use crate::domain::role::errors::RoleError;
use crate::domain::role::models::Permissions;
use crate::domain::role::models::RoleId;
use crate::domain::role::models::RolePatch;
use crate::domain::role::models::UpdateRoleCommand;
use crate::domain::role::ports::RoleServicePort;
use crate::inbound::http::handlers::deserialize_present;
use crate::inbound::http::handlers::ApiError;
use crate::inbound::http::handlers::ApiSuccess;
use crate::inbound::http::handlers::JsonBody;
use crate::inbound::http::router::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UpdateRoleRequest {
    pub name: Option<String>,
    #[serde(deserialize_with = "deserialize_present")]
    pub description: Option<Option<String>>,
    pub permissions: Option<Permissions>,
    pub active: Option<bool>,
}

impl From<UpdateRoleRequest> for RolePatch {
    fn from(req: UpdateRoleRequest) -> Self {
        RolePatch {
            name: req.name,
            description: req.description,
            permissions: req.permissions,
            active: req.active,
        }
    }
}

pub async fn update_role(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(req): JsonBody<UpdateRoleRequest>,
) -> Result<ApiSuccess<RoleData>, ApiError> {
    let role_id = RoleId::from_string(&id).map_err(RoleError::from)?;
    let command = UpdateRoleCommand::try_from(RolePatch::from(req)).map_err(RoleError::from)?;

    state
        .role_service
        .update_role(&role_id, command)
        .await
        .map_err(ApiError::from)
        .map(|role| ApiSuccess::new(StatusCode::OK, role.into()))
}
