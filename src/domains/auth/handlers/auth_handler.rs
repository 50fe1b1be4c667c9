use axum::{extract::State, http::StatusCode, Json};
use serde_json::Value;

use crate::domains::auth::models::{
    LoginRequest, LogoutAllResponse, LogoutRequest, MessageResponse, RefreshTokenRequest,
    RegisterRequest, TokenResponse, UserResponse,
};
use crate::shared::middleware::{AuthenticatedUser, ClientInfo};
use crate::shared::services::AppState;

type ApiError = (StatusCode, Json<Value>);

// 회원가입 핸들러
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered, session issued", body = TokenResponse),
        (status = 409, description = "Username or email already exists"),
        (status = 422, description = "Validation error"),
        (status = 429, description = "Rate limit exceeded"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Auth"
)]
pub async fn register(
    State(app_state): State<AppState>,
    ClientInfo(ctx): ClientInfo,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<TokenResponse>), ApiError> {
    let request = request.validate(&app_state.config.password_policy)?;

    // Service 호출 (비즈니스 로직)
    let tokens = app_state
        .auth_state
        .auth_service
        .register(&request.username, &request.email, &request.password, ctx)
        .await?;

    Ok((StatusCode::CREATED, Json(tokens)))
}

// 로그인 핸들러
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = TokenResponse),
        (status = 401, description = "Invalid username or password"),
        (status = 403, description = "Account is inactive"),
        (status = 429, description = "Rate limit exceeded"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Auth"
)]
pub async fn login(
    State(app_state): State<AppState>,
    ClientInfo(ctx): ClientInfo,
    Json(request): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let request = request.validate()?;

    let tokens = app_state
        .auth_state
        .auth_service
        .login(&request.username, &request.password, ctx)
        .await?;

    Ok(Json(tokens))
}

/// 토큰 갱신 핸들러
/// Refresh token handler
#[utoipa::path(
    post,
    path = "/api/auth/refresh",
    request_body = RefreshTokenRequest,
    responses(
        (status = 200, description = "Token refreshed successfully", body = TokenResponse),
        (status = 401, description = "Invalid, revoked or expired refresh token"),
        (status = 403, description = "Account is inactive"),
        (status = 429, description = "Rate limit exceeded"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Auth"
)]
pub async fn refresh(
    State(app_state): State<AppState>,
    ClientInfo(ctx): ClientInfo,
    Json(request): Json<RefreshTokenRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let request = request.validate()?;

    let tokens = app_state
        .auth_state
        .auth_service
        .refresh(&request.refresh_token, ctx, request.rotate)
        .await?;

    Ok(Json(tokens))
}

/// 로그아웃 핸들러
/// Logout handler
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    request_body = LogoutRequest,
    responses(
        (status = 200, description = "Logout successful", body = MessageResponse),
        (status = 401, description = "Invalid token"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("BearerAuth" = [])
    ),
    tag = "Auth"
)]
pub async fn logout(
    State(app_state): State<AppState>,
    authenticated_user: AuthenticatedUser,
    Json(request): Json<LogoutRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let request = request.validate()?;

    app_state
        .auth_state
        .auth_service
        .logout(&request.refresh_token, authenticated_user.user_id)
        .await?;

    Ok(Json(MessageResponse::new("Logout successful")))
}

/// 모든 기기에서 로그아웃
/// Logout from all devices
#[utoipa::path(
    post,
    path = "/api/auth/logout-all",
    responses(
        (status = 200, description = "All sessions revoked", body = LogoutAllResponse),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("BearerAuth" = [])
    ),
    tag = "Auth"
)]
pub async fn logout_all(
    State(app_state): State<AppState>,
    authenticated_user: AuthenticatedUser,
) -> Result<Json<LogoutAllResponse>, ApiError> {
    let revoked_sessions = app_state
        .auth_state
        .auth_service
        .logout_all_devices(authenticated_user.user_id)
        .await?;

    Ok(Json(LogoutAllResponse {
        revoked_sessions,
        message: "Logged out from all devices".to_string(),
    }))
}

#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "User info retrieved successfully", body = UserResponse),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("BearerAuth" = [])
    ),
    tag = "Auth"
)]
pub async fn get_me(
    State(app_state): State<AppState>,
    authenticated_user: AuthenticatedUser,
) -> Result<Json<UserResponse>, ApiError> {
    let user = app_state
        .auth_state
        .auth_service
        .get_user_info(authenticated_user.user_id)
        .await?;

    Ok(Json(user.into()))
}
