use axum::extract::State;
use axum::http::StatusCode;

use super::ListQuery;
use super::UserData;
use crate::domain::pagination::PageRequest;
use crate::domain::user::ports::UserServicePort;
use crate::inbound::http::handlers::ApiError;
use crate::inbound::http::handlers::ApiSuccess;
use crate::inbound::http::handlers::QueryParams;
use crate::inbound::http::router::AppState;

pub async fn list_users(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<ListQuery>,
) -> Result<ApiSuccess<Vec<UserData>>, ApiError> {
    let request = PageRequest::parse(query.page.as_deref(), query.limit.as_deref(), query.search)?;

    state
        .user_service
        .list_users(&request)
        .await
        .map_err(ApiError::from)
        .map(|page| ApiSuccess::paged(StatusCode::OK, page))
}
