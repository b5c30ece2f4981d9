use std::sync::Arc;
use std::time::Duration;
use std::time::Instant;

use axum::body::Body;
use axum::http::Request;
use axum::http::Response;
use axum::http::StatusCode;
use axum::http::Uri;
use axum::middleware;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::routing::post;
use axum::Json;
use axum::Router;
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::Span;

use super::handlers::auth;
use super::handlers::health;
use super::handlers::roles;
use super::handlers::users;
use super::middleware::authenticate;
use super::middleware::report_errors;
use super::middleware::require_roles;
use super::middleware::AllowedRoles;
use crate::config::RunMode;
use crate::domain::auth::ports::AuthServicePort;
use crate::domain::health::ReadinessProbe;
use crate::domain::role::models::ADMIN_ROLE;
use crate::domain::role::ports::RoleServicePort;
use crate::domain::user::ports::UserServicePort;

pub const API_PREFIX: &str = "/api/v1";

/// Roles allowed to create, modify and delete users.
pub const USER_ADMIN_ROLES: AllowedRoles = AllowedRoles(&[ADMIN_ROLE]);

#[derive(Clone)]
pub struct AppState {
    pub auth_service: Arc<dyn AuthServicePort>,
    pub user_service: Arc<dyn UserServicePort>,
    pub role_service: Arc<dyn RoleServicePort>,
    pub readiness: Arc<dyn ReadinessProbe>,
    pub run_mode: RunMode,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(
        auth_service: Arc<dyn AuthServicePort>,
        user_service: Arc<dyn UserServicePort>,
        role_service: Arc<dyn RoleServicePort>,
        readiness: Arc<dyn ReadinessProbe>,
        run_mode: RunMode,
    ) -> Self {
        Self {
            auth_service,
            user_service,
            role_service,
            readiness,
            run_mode,
            started_at: Instant::now(),
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    let gate = middleware::from_fn_with_state(state.clone(), authenticate);

    let health_routes = Router::new()
        .route("/", get(health::health))
        .route("/live", get(health::live))
        .route("/ready", get(health::ready));

    let auth_routes = Router::new()
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me))
        .route_layer(gate.clone())
        .route("/register", post(auth::register))
        .route("/login", post(auth::login));

    let user_admin_routes = Router::new()
        .route("/", post(users::create_user))
        .route(
            "/:user_id",
            axum::routing::put(users::update_user).delete(users::delete_user),
        )
        .route_layer(middleware::from_fn_with_state(
            USER_ADMIN_ROLES,
            require_roles,
        ));

    let user_routes = Router::new()
        .route("/", get(users::list_users))
        .route("/:user_id", get(users::get_user))
        .merge(user_admin_routes)
        .route_layer(gate.clone());

    let role_routes = Router::new()
        .route("/", get(roles::list_roles).post(roles::create_role))
        .route(
            "/:role_id",
            get(roles::get_role)
                .put(roles::update_role)
                .delete(roles::delete_role),
        )
        .route_layer(gate);

    let api = Router::new()
        .nest("/health", health_routes)
        .nest("/auth", auth_routes)
        .nest("/users", user_routes)
        .nest("/roles", role_routes);

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|request: &Request<Body>| {
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
                version = ?request.version(),
            )
        })
        .on_request(|request: &Request<Body>, _span: &Span| {
            tracing::info!(
                method = %request.method(),
                uri = %request.uri(),
                "Request started"
            );
        })
        .on_response(
            |response: &Response<Body>, latency: Duration, _span: &Span| {
                tracing::info!(
                    status = response.status().as_u16(),
                    latency_ms = latency.as_millis(),
                    "Request completed"
                );
            },
        );

    Router::new()
        .nest(API_PREFIX, api)
        .fallback(route_not_found)
        .layer(middleware::from_fn_with_state(
            state.run_mode,
            report_errors,
        ))
        .layer(trace_layer)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn route_not_found(method: axum::http::Method, uri: Uri) -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": {
                "message": "Route not found",
                "statusCode": StatusCode::NOT_FOUND.as_u16(),
                "path": uri.to_string(),
                "method": method.as_str(),
            }
        })),
    )
}
