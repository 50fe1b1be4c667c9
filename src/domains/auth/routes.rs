// Auth domain routes
// 인증 도메인 라우터
use axum::{
    routing::{delete, get, post},
    Router,
};

use crate::domains::auth::handlers::{admin_handler, auth_handler, user_handler};
use crate::shared::services::AppState;

/// Create authentication router
/// 인증 라우터 생성
pub fn create_auth_router() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth_handler::register))
        .route("/login", post(auth_handler::login))
        .route("/refresh", post(auth_handler::refresh))
        .route("/logout", post(auth_handler::logout))
        .route("/logout-all", post(auth_handler::logout_all))
        .route("/me", get(auth_handler::get_me))
}

/// 사용자 프로필 라우터
pub fn create_user_router() -> Router<AppState> {
    Router::new().route(
        "/me",
        get(user_handler::get_profile)
            .put(user_handler::update_me)
            .delete(user_handler::delete_me),
    )
}

/// 관리자 라우터
pub fn create_admin_router() -> Router<AppState> {
    Router::new().route(
        "/rate-limits/:identity",
        delete(admin_handler::reset_rate_limit),
    )
}
