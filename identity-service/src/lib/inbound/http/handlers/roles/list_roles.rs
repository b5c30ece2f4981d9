use axum::extract::State;
use axum::http::StatusCode;

use super::RoleData;
use crate::domain::pagination::PageRequest;
use crate::domain::role::ports::RoleServicePort;
use crate::inbound::http::handlers::users::ListQuery;
use crate::inbound::http::handlers::ApiError;
use crate::inbound::http::handlers::ApiSuccess;
use crate::inbound::http::handlers::QueryParams;
use crate::inbound::http::router::AppState;

pub async fn list_roles(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<ListQuery>,
) -> Result<ApiSuccess<Vec<RoleData>>, ApiError> {
    let request = PageRequest::parse(query.page.as_deref(), query.limit.as_deref(), query.search)?;

    state
        .role_service
        .list_roles(&request)
        .await
        .map_err(ApiError::from)
        .map(|page| ApiSuccess::paged(StatusCode::OK, page))
}
