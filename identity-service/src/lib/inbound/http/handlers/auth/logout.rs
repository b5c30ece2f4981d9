use axum::extract::State;
use axum::http::StatusCode;
use axum::Extension;

use crate::domain::auth::models::AuthenticatedUser;
use crate::domain::auth::ports::AuthServicePort;
use crate::inbound::http::handlers::ApiError;
use crate::inbound::http::handlers::ApiSuccess;
use crate::inbound::http::handlers::MessageData;
use crate::inbound::http::router::AppState;

pub async fn logout(
    State(state): State<AppState>,
    Extension(identity): Extension<AuthenticatedUser>,
) -> Result<ApiSuccess<MessageData>, ApiError> {
    state
        .auth_service
        .logout(&identity.user_id, &identity.token)
        .await?;

    Ok(ApiSuccess::new(
        StatusCode::OK,
        MessageData {
            message: "Logged out successfully".to_string(),
        },
    ))
}
