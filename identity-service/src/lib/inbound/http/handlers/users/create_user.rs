use axum::extract::State;
use axum::http::StatusCode;
use serde::Deserialize;

use super::UserData;
use crate::domain::user::models::CreateUserCommand;
use crate::domain::user::models::UserDraft;
use crate::domain::user::ports::UserServicePort;
use crate::inbound::http::handlers::ApiError;
use crate::inbound::http::handlers::ApiSuccess;
use crate::inbound::http::handlers::JsonBody;
use crate::inbound::http::router::AppState;
use crate::user::errors::UserError;

pub async fn create_user(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<CreateUserRequest>,
) -> Result<ApiSuccess<UserData>, ApiError> {
    let command = CreateUserCommand::try_from(body.into_draft()).map_err(UserError::from)?;

    state
        .user_service
        .create_user(command)
        .await
        .map_err(ApiError::from)
        .map(|user| ApiSuccess::new(StatusCode::CREATED, user.into()))
}

/// HTTP request body for creating a user (raw JSON)
#[derive(Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CreateUserRequest {
    username: String,
    full_name: String,
    email: String,
    password: String,
    role_id: Option<String>,
    active: Option<bool>,
}

impl CreateUserRequest {
    fn into_draft(self) -> UserDraft {
        UserDraft {
            username: self.username,
            full_name: self.full_name,
            email: self.email,
            password: self.password,
            role_id: self.role_id,
            active: self.active,
        }
    }
}
