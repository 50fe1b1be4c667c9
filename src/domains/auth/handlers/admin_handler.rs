use axum::{
    extract::{Path, State},
    Json,
};

use crate::domains::auth::models::MessageResponse;
use crate::shared::middleware::AdminUser;
use crate::shared::services::AppState;

// 요청 제한 초기화 (관리자 전용)
#[utoipa::path(
    delete,
    path = "/api/admin/rate-limits/{identity}",
    params(
        ("identity" = String, Path, description = "Client identity (IP address)")
    ),
    responses(
        (status = 200, description = "Counters cleared", body = MessageResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only")
    ),
    security(
        ("BearerAuth" = [])
    ),
    tag = "Admin"
)]
pub async fn reset_rate_limit(
    State(app_state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(identity): Path<String>,
) -> Json<MessageResponse> {
    app_state.rate_limiter.reset(&identity);

    tracing::info!(admin_id = admin.user_id, identity = %identity, "rate limit counters reset");
    Json(MessageResponse::new(format!(
        "Rate limit counters cleared for {}",
        identity
    )))
}
