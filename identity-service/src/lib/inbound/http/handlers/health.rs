use axum::extract::State;
use axum::Json;
use chrono::DateTime;
use chrono::Utc;
use serde::Serialize;

use crate::domain::health::ReadinessProbe;
use crate::inbound::http::handlers::ApiError;
use crate::inbound::http::handlers::ApiErrorKind;
use crate::inbound::http::router::AppState;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
    pub uptime_seconds: u64,
    pub database: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProbeStatus {
    pub status: &'static str,
}

/// Overall status. Always 200; the body says whether the store is reachable.
pub async fn health(State(state): State<AppState>) -> Json<HealthReport> {
    let connected = match state.readiness.check().await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "Health check could not reach the database");
            false
        }
    };

    Json(HealthReport {
        status: if connected { "ok" } else { "error" },
        timestamp: Utc::now(),
        uptime_seconds: state.started_at.elapsed().as_secs(),
        database: if connected { "connected" } else { "disconnected" },
    })
}

pub async fn live() -> Json<ProbeStatus> {
    Json(ProbeStatus { status: "alive" })
}

pub async fn ready(State(state): State<AppState>) -> Result<Json<ProbeStatus>, ApiError> {
    state.readiness.check().await.map_err(|e| {
        tracing::warn!(error = %e, "Readiness check failed");
        ApiError::new(ApiErrorKind::ServiceUnavailable, "health", "Database not ready")
    })?;

    Ok(Json(ProbeStatus { status: "ready" }))
}
