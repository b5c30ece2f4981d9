use std::net::SocketAddr;

use axum::body::Body;
use axum::body::Bytes;
use axum::extract::ConnectInfo;
use axum::extract::Request;
use axum::extract::State;
use axum::http::header;
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::IntoResponse;
use axum::response::Response;
use serde_json::Value;

use crate::config::RunMode;
use crate::domain::auth::errors::AuthError;
use crate::domain::auth::models::AuthenticatedUser;
use crate::inbound::http::handlers::ApiError;
use crate::inbound::http::router::AppState;

/// Bodies up to this size are buffered so they can be logged with internal errors.
const MAX_LOGGED_BODY_BYTES: usize = 64 * 1024;

const REDACTED: &str = "[REDACTED]";

/// Authorization gate: resolves the bearer token to an [`AuthenticatedUser`]
/// and stores it in the request extensions.
pub async fn authenticate(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer_token(req.headers()).ok_or(AuthError::MissingToken)?;

    let identity = state.auth_service.authorize(&token).await?;
    req.extensions_mut().insert(identity);

    Ok(next.run(req).await)
}

fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        return None;
    }
    Some(token.to_string())
}

/// Role names admitted by a [`require_roles`] layer.
#[derive(Debug, Clone, Copy)]
pub struct AllowedRoles(pub &'static [&'static str]);

/// Role gate. Must run after [`authenticate`].
pub async fn require_roles(
    State(allowed): State<AllowedRoles>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let identity = req
        .extensions()
        .get::<AuthenticatedUser>()
        .ok_or(AuthError::MissingToken)?;

    if let Err(e) = identity.require_any_role(allowed.0) {
        tracing::warn!(
            user_id = %identity.user_id,
            role = ?identity.role_name,
            allowed = ?allowed.0,
            "Access denied by role gate"
        );
        return Err(e.into());
    }

    Ok(next.run(req).await)
}

/// Best-effort client address: first `X-Forwarded-For` hop, else the peer address.
pub fn client_ip(headers: &HeaderMap, connect_info: Option<&ConnectInfo<SocketAddr>>) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|ip| ip.trim().to_string())
        .filter(|ip| !ip.is_empty())
        .or_else(|| connect_info.map(|ConnectInfo(addr)| addr.ip().to_string()))
}

/// Error reporter: logs internal errors with request context and hides
/// their message from clients in production.
pub async fn report_errors(
    State(run_mode): State<RunMode>,
    req: Request,
    next: Next,
) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let query = req.uri().query().map(str::to_string);
    let ip = client_ip(
        req.headers(),
        req.extensions().get::<ConnectInfo<SocketAddr>>(),
    );
    let (req, body) = capture_body(req).await;

    let response = next.run(req).await;

    let Some(error) = response.extensions().get::<ApiError>().cloned() else {
        return response;
    };
    if !error.kind.is_internal() {
        return response;
    }

    tracing::error!(
        method = %method,
        path = %path,
        query = ?query,
        ip = ?ip,
        body = %body.as_ref().map(|b| redact_body(b)).unwrap_or_default(),
        component = error.component,
        code = error.kind.code(),
        error = %error.message,
        "Request failed with internal error"
    );

    if run_mode.is_production() {
        return ApiError {
            message: "Internal Server Error".to_string(),
            ..error
        }
        .into_response();
    }

    response
}

async fn capture_body(req: Request) -> (Request, Option<Bytes>) {
    let small_enough = req
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok())
        .is_some_and(|len| len > 0 && len <= MAX_LOGGED_BODY_BYTES);
    if !small_enough {
        return (req, None);
    }

    let (parts, body) = req.into_parts();
    match axum::body::to_bytes(body, MAX_LOGGED_BODY_BYTES).await {
        Ok(bytes) => (
            Request::from_parts(parts, Body::from(bytes.clone())),
            Some(bytes),
        ),
        Err(e) => {
            tracing::debug!(error = %e, "Could not buffer request body");
            (Request::from_parts(parts, Body::empty()), None)
        }
    }
}

/// Render a request body for logs with every password-like field masked.
fn redact_body(body: &[u8]) -> String {
    match serde_json::from_slice::<Value>(body) {
        Ok(mut value) => {
            redact_value(&mut value);
            value.to_string()
        }
        Err(_) => format!("<{} bytes, not JSON>", body.len()),
    }
}

fn redact_value(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (key, field) in map.iter_mut() {
                if key.to_ascii_lowercase().contains("password") {
                    *field = Value::String(REDACTED.to_string());
                } else {
                    redact_value(field);
                }
            }
        }
        Value::Array(items) => items.iter_mut().for_each(redact_value),
        _ => {}
    }
}
