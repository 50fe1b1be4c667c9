use axum::{extract::State, http::StatusCode, Json};
use serde_json::Value;

use crate::domains::auth::models::{MessageResponse, UpdateUserRequest, UserResponse};
use crate::shared::middleware::AuthenticatedUser;
use crate::shared::services::AppState;

/// 내 프로필 조회 핸들러
#[utoipa::path(
    get,
    path = "/api/users/me",
    responses(
        (status = 200, description = "Current user's profile", body = UserResponse),
        (status = 401, description = "Unauthorized"),
        (status = 429, description = "Rate limit exceeded")
    ),
    security(
        ("BearerAuth" = [])
    ),
    tag = "Users"
)]
pub async fn get_profile(
    State(app_state): State<AppState>,
    authenticated_user: AuthenticatedUser,
) -> Result<Json<UserResponse>, (StatusCode, Json<Value>)> {
    let user = app_state
        .auth_state
        .auth_service
        .get_user_info(authenticated_user.user_id)
        .await?;

    Ok(Json(user.into()))
}

/// 프로필 수정 핸들러
/// Update the caller's username and/or email
#[utoipa::path(
    put,
    path = "/api/users/me",
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "Profile updated", body = UserResponse),
        (status = 401, description = "Unauthorized"),
        (status = 409, description = "Username or email already exists"),
        (status = 422, description = "Validation error")
    ),
    security(
        ("BearerAuth" = [])
    ),
    tag = "Users"
)]
pub async fn update_me(
    State(app_state): State<AppState>,
    authenticated_user: AuthenticatedUser,
    Json(request): Json<UpdateUserRequest>,
) -> Result<Json<UserResponse>, (StatusCode, Json<Value>)> {
    let update = request.validate()?;

    let user = app_state
        .auth_state
        .user_service
        .update_profile(authenticated_user.user_id, update)
        .await?;

    Ok(Json(user.into()))
}

/// 계정 삭제 (비활성화) 핸들러
#[utoipa::path(
    delete,
    path = "/api/users/me",
    responses(
        (status = 200, description = "Account deactivated", body = MessageResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("BearerAuth" = [])
    ),
    tag = "Users"
)]
pub async fn delete_me(
    State(app_state): State<AppState>,
    authenticated_user: AuthenticatedUser,
) -> Result<Json<MessageResponse>, (StatusCode, Json<Value>)> {
    app_state
        .auth_state
        .user_service
        .deactivate_account(authenticated_user.user_id)
        .await?;

    Ok(Json(MessageResponse::new("Account deactivated")))
}
