use axum::extract::State;
use axum::http::StatusCode;
use serde::Deserialize;

use super::AuthResponseData;
use crate::domain::auth::errors::AuthError;
use crate::domain::auth::models::RegisterCommand;
use crate::domain::auth::ports::AuthServicePort;
use crate::domain::user::models::UserDraft;
use crate::inbound::http::client::Client;
use crate::inbound::http::handlers::ApiError;
use crate::inbound::http::handlers::ApiSuccess;
use crate::inbound::http::handlers::JsonBody;
use crate::inbound::http::router::AppState;

pub async fn register(
    State(state): State<AppState>,
    Client(client): Client,
    JsonBody(body): JsonBody<RegisterRequest>,
) -> Result<ApiSuccess<AuthResponseData>, ApiError> {
    let command = RegisterCommand::try_from(body.into_draft()).map_err(AuthError::from)?;

    state
        .auth_service
        .register(command, &client)
        .await
        .map_err(ApiError::from)
        .map(|outcome| ApiSuccess::new(StatusCode::CREATED, outcome.into()))
}

/// HTTP request body for self-service registration (raw JSON)
#[derive(Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RegisterRequest {
    username: String,
    full_name: String,
    email: String,
    password: String,
}

impl RegisterRequest {
    fn into_draft(self) -> UserDraft {
        UserDraft {
            username: self.username,
            full_name: self.full_name,
            email: self.email,
            password: self.password,
            ..Default::default()
        }
    }
}
