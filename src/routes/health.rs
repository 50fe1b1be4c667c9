use axum::{extract::State, http::StatusCode, Json};
use serde_json::{json, Value};

use crate::shared::database::CredentialStore;
use crate::shared::services::AppState;

// 헬스 체크 (요청 제한 제외)
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is up")
    ),
    tag = "Health"
)]
pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Readiness: 저장소에 연결할 수 없으면 503
#[utoipa::path(
    get,
    path = "/health/ready",
    responses(
        (status = 200, description = "Ready to accept traffic"),
        (status = 503, description = "Credential store unreachable")
    ),
    tag = "Health"
)]
pub async fn readiness_check(State(app_state): State<AppState>) -> (StatusCode, Json<Value>) {
    let environment = app_state.config.environment.as_str();

    match app_state.store.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "status": "ready",
                "environment": environment,
                "database": "connected",
            })),
        ),
        Err(e) => {
            tracing::error!(error = %e, "readiness check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "unavailable",
                    "database": "disconnected",
                })),
            )
        }
    }
}
