use axum::extract::rejection::JsonRejection;
use axum::extract::rejection::QueryRejection;
use axum::extract::FromRequest;
use axum::extract::FromRequestParts;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::Json;
use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;

use crate::domain::auth::errors::AuthError;
use crate::domain::pagination::Page;
use crate::domain::pagination::PaginationError;
use crate::domain::role::errors::RoleError;
use crate::domain::session::errors::SessionError;
use crate::user::errors::UserError;

pub mod auth;
pub mod health;
pub mod roles;
pub mod users;

#[derive(Debug, Clone)]
pub struct ApiSuccess<T: Serialize + PartialEq>(StatusCode, Json<ApiResponseBody<T>>);

impl<T> PartialEq for ApiSuccess<T>
where
    T: Serialize + PartialEq,
{
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0 && self.1 .0 == other.1 .0
    }
}

impl<T: Serialize + PartialEq> ApiSuccess<T> {
    pub fn new(status: StatusCode, data: T) -> Self {
        ApiSuccess(status, Json(ApiResponseBody::new(status, data)))
    }
}

impl<T: Serialize + PartialEq> ApiSuccess<Vec<T>> {
    /// A list response carrying its paging metadata next to `data`.
    pub fn paged<U>(status: StatusCode, page: Page<U>) -> Self
    where
        T: From<U>,
    {
        let pagination = PaginationData {
            page: page.pagination.page,
            limit: page.pagination.limit,
            total: page.pagination.total,
            total_pages: page.pagination.total_pages,
        };
        let data = page.data.into_iter().map(T::from).collect();

        ApiSuccess(
            status,
            Json(ApiResponseBody {
                status_code: status.as_u16(),
                data,
                pagination: Some(pagination),
            }),
        )
    }
}

impl<T: Serialize + PartialEq> IntoResponse for ApiSuccess<T> {
    fn into_response(self) -> Response {
        (self.0, self.1).into_response()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponseBody<T: Serialize + PartialEq> {
    status_code: u16,
    data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pagination: Option<PaginationData>,
}

impl<T: Serialize + PartialEq> ApiResponseBody<T> {
    pub fn new(status_code: StatusCode, data: T) -> Self {
        Self {
            status_code: status_code.as_u16(),
            data,
            pagination: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationData {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u64,
}

/// Message-only payload, e.g. for logout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageData {
    pub message: String,
}

/// Deserialize a field that distinguishes "absent" (`None`) from "null" (`Some(None)`).
///
/// Use together with `#[serde(default)]`.
pub(crate) fn deserialize_present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// JSON body extractor whose rejections use the API error envelope.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct JsonBody<T>(pub T);

/// Query string extractor whose rejections use the API error envelope.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct QueryParams<T>(pub T);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorKind {
    Validation,
    BadRequest,
    Unauthorized,
    Forbidden,
    NotFound,
    Conflict,
    ServiceUnavailable,
    Database,
    Internal,
}

impl ApiErrorKind {
    pub fn status(self) -> StatusCode {
        match self {
            ApiErrorKind::Validation => StatusCode::UNPROCESSABLE_ENTITY,
            ApiErrorKind::BadRequest => StatusCode::BAD_REQUEST,
            ApiErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiErrorKind::Forbidden => StatusCode::FORBIDDEN,
            ApiErrorKind::NotFound => StatusCode::NOT_FOUND,
            ApiErrorKind::Conflict => StatusCode::CONFLICT,
            ApiErrorKind::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ApiErrorKind::Database | ApiErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            ApiErrorKind::Validation => "VALIDATION_ERROR",
            ApiErrorKind::BadRequest => "BAD_REQUEST_ERROR",
            ApiErrorKind::Unauthorized => "UNAUTHORIZED_ERROR",
            ApiErrorKind::Forbidden => "FORBIDDEN_ERROR",
            ApiErrorKind::NotFound => "NOTFOUND_ERROR",
            ApiErrorKind::Conflict => "CONFLICT_ERROR",
            ApiErrorKind::ServiceUnavailable => "SERVICE_UNAVAILABLE",
            ApiErrorKind::Database => "DATABASE_ERROR",
            ApiErrorKind::Internal => "INTERNAL_ERROR",
        }
    }

    pub fn is_internal(self) -> bool {
        matches!(self, ApiErrorKind::Database | ApiErrorKind::Internal)
    }
}

/// Error returned by every handler and gate.
///
/// The rendered response carries a copy of the error in its extensions so
/// the error reporter can log and mask it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub kind: ApiErrorKind,
    pub message: String,
    pub component: &'static str,
    pub timestamp: DateTime<Utc>,
}

impl ApiError {
    pub fn new(kind: ApiErrorKind, component: &'static str, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            component,
            timestamp: Utc::now(),
        }
    }

    pub fn bad_request(component: &'static str, message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::BadRequest, component, message)
    }

    pub fn internal(component: &'static str, message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Internal, component, message)
    }

    pub fn status(&self) -> StatusCode {
        self.kind.status()
    }

    /// Re-attribute the error to another component.
    pub fn in_component(mut self, component: &'static str) -> Self {
        self.component = component;
        self
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ApiErrorData<'a> {
    message: &'a str,
    status_code: u16,
    code: &'static str,
    component: &'static str,
    timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
struct ApiErrorBody<'a> {
    error: ApiErrorData<'a>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ApiErrorBody {
            error: ApiErrorData {
                message: &self.message,
                status_code: status.as_u16(),
                code: self.kind.code(),
                component: self.component,
                timestamp: self.timestamp,
            },
        };

        let mut response = (status, Json(body)).into_response();
        response.extensions_mut().insert(self);
        response
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::new(ApiErrorKind::Validation, "http", rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::bad_request("http", rejection.body_text())
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        Self::internal("http", e.to_string())
    }
}

impl From<PaginationError> for ApiError {
    fn from(err: PaginationError) -> Self {
        ApiError::bad_request("pagination", err.to_string())
    }
}

impl From<UserError> for ApiError {
    fn from(err: UserError) -> Self {
        let kind = match err {
            UserError::InvalidUserId(_) => ApiErrorKind::BadRequest,
            UserError::Validation(_) | UserError::UnknownRole(_) => ApiErrorKind::Validation,
            UserError::NotFound(_) => ApiErrorKind::NotFound,
            UserError::UsernameAlreadyExists(_) | UserError::EmailAlreadyExists(_) => {
                ApiErrorKind::Conflict
            }
            UserError::PasswordHashing(_) => ApiErrorKind::Internal,
            UserError::DatabaseError(_) => ApiErrorKind::Database,
        };
        ApiError::new(kind, "users", err.to_string())
    }
}

impl From<RoleError> for ApiError {
    fn from(err: RoleError) -> Self {
        let kind = match err {
            RoleError::InvalidRoleId(_) => ApiErrorKind::BadRequest,
            RoleError::Validation(_) => ApiErrorKind::Validation,
            RoleError::NotFound(_) => ApiErrorKind::NotFound,
            RoleError::NameAlreadyExists(_) => ApiErrorKind::Conflict,
            RoleError::DatabaseError(_) => ApiErrorKind::Database,
        };
        ApiError::new(kind, "roles", err.to_string())
    }
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        let kind = match err {
            SessionError::DuplicateToken => ApiErrorKind::Internal,
            SessionError::DatabaseError(_) => ApiErrorKind::Database,
        };
        ApiError::new(kind, "sessions", err.to_string())
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        let kind = match err {
            AuthError::User(e) => return ApiError::from(e).in_component("auth"),
            AuthError::Role(e) => return ApiError::from(e).in_component("auth"),
            AuthError::Session(e) => return ApiError::from(e).in_component("auth"),
            AuthError::Validation(_) => ApiErrorKind::Validation,
            AuthError::InvalidCredentials
            | AuthError::AccountInactive
            | AuthError::MissingToken
            | AuthError::InvalidToken
            | AuthError::InvalidSession => ApiErrorKind::Unauthorized,
            AuthError::UserUnavailable => ApiErrorKind::NotFound,
            AuthError::MissingRole | AuthError::InsufficientRole => ApiErrorKind::Forbidden,
            AuthError::TokenIssuing(_) | AuthError::PasswordHashing(_) => ApiErrorKind::Internal,
        };
        ApiError::new(kind, "auth", err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use axum::body::to_bytes;
    use serde_json::Value;

    use super::*;
    use crate::domain::validation::ValidationErrors;

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_error_envelope() {
        let response = ApiError::from(AuthError::InvalidSession).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(response.extensions().get::<ApiError>().is_some());

        let body = body_json(response).await;
        assert_eq!(body["error"]["message"], "Invalid or expired session");
        assert_eq!(body["error"]["statusCode"], 401);
        assert_eq!(body["error"]["code"], "UNAUTHORIZED_ERROR");
        assert_eq!(body["error"]["component"], "auth");
        assert!(body["error"]["timestamp"].is_string());
    }

    #[tokio::test]
    async fn test_success_envelope_with_pagination() {
        use crate::domain::pagination::PageRequest;
        use crate::domain::pagination::PageSlice;

        let request = PageRequest::new(Some(2), Some(10), None).unwrap();
        let page = Page::from_slice(
            PageSlice {
                items: vec![11u32, 12],
                total: 25,
            },
            &request,
        );

        let response = ApiSuccess::<Vec<u64>>::paged(StatusCode::OK, page).into_response();
        let body = body_json(response).await;

        assert_eq!(body["statusCode"], 200);
        assert_eq!(body["data"], serde_json::json!([11, 12]));
        assert_eq!(body["pagination"]["totalPages"], 3);
        assert_eq!(body["pagination"]["page"], 2);
    }

    #[derive(Debug, Deserialize)]
    struct Paging {
        page: Option<String>,
    }

    async fn extract_query(uri: &str) -> Result<QueryParams<Paging>, ApiError> {
        let (mut parts, _) = axum::http::Request::builder()
            .uri(uri)
            .body(())
            .unwrap()
            .into_parts();
        QueryParams::<Paging>::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn test_query_rejection_uses_error_envelope() {
        let QueryParams(paging) = extract_query("/users?page=2").await.unwrap();
        assert_eq!(paging.page.as_deref(), Some("2"));

        let Err(error) = extract_query("/users?page=1&page=2").await else {
            panic!("duplicate page parameter was accepted");
        };
        assert_eq!(error.kind, ApiErrorKind::BadRequest);
        assert_eq!(error.component, "http");

        let body = body_json(error.into_response()).await;
        assert_eq!(body["error"]["statusCode"], 400);
        assert_eq!(body["error"]["code"], "BAD_REQUEST_ERROR");
        assert!(body["error"]["message"].as_str().unwrap().contains("page"));
    }

    #[test]
    fn test_status_mapping() {
        let conflict = ApiError::from(AuthError::User(UserError::EmailAlreadyExists(
            "a@x.com".to_string(),
        )));
        assert_eq!(conflict.status(), StatusCode::CONFLICT);
        assert_eq!(conflict.component, "auth");

        let mut errors = ValidationErrors::new();
        errors.add("username", "is required");
        assert_eq!(
            ApiError::from(UserError::Validation(errors)).status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ApiError::from(AuthError::InsufficientRole).status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ApiError::from(AuthError::UserUnavailable).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(RoleError::DatabaseError("down".to_string())).kind,
            ApiErrorKind::Database
        );
        assert_eq!(
            ApiError::from(PaginationError::PageOutOfRange(0)).status(),
            StatusCode::BAD_REQUEST
        );
    }
}
