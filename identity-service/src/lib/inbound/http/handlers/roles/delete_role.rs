use axum::extract::Path;
use axum::extract::State;
use axum::http::StatusCode;

use crate::domain::role::errors::RoleError;
use crate::domain::role::models::RoleId;
use crate::domain::role::ports::RoleServicePort;
use crate::inbound::http::handlers::ApiError;
use crate::inbound::http::router::AppState;

pub async fn delete_role(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let role_id = RoleId::from_string(&id).map_err(RoleError::from)?;

    state.role_service.delete_role(&role_id).await?;

    Ok(StatusCode::NO_CONTENT)
}
