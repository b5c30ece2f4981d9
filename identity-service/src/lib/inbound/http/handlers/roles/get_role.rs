use axum::extract::Path;
use axum::extract::State;
use axum::http::StatusCode;

use super::RoleData;
use crate::domain::role::errors::RoleError;
use crate::domain::role::models::RoleId;
use crate::domain::role::ports::RoleServicePort;
use crate::inbound::http::handlers::ApiError;
use crate::inbound::http::handlers::ApiSuccess;
use crate::inbound::http::router::AppState;

pub async fn get_role(
    State(state): State<AppState>,
    Path(role_id): Path<String>,
) -> Result<ApiSuccess<RoleData>, ApiError> {
    let role_id = RoleId::from_string(&role_id).map_err(RoleError::from)?;

    state
        .role_service
        .get_role(&role_id)
        .await
        .map_err(ApiError::from)
        .map(|role| ApiSuccess::new(StatusCode::OK, role.into()))
}
