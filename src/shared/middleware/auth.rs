use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts, StatusCode},
    Json,
};
use serde_json::Value;

use crate::shared::errors::AuthError;
use crate::shared::services::AppState;

/// 인증된 사용자 정보 (JWT 토큰 검증 + 계정 활성 상태 확인)
/// Authenticated, active user behind the request's bearer token
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: i64,
    pub username: String,
    pub is_admin: bool,
}

/// AuthenticatedUser를 Axum Extractor로 구현
///
/// 사용법:
/// ```rust,ignore
/// pub async fn get_me(
///     State(app_state): State<AppState>,
///     authenticated_user: AuthenticatedUser,  // <- 이렇게 사용!
/// ) -> Result<...> {
///     let user_id = authenticated_user.user_id;
///     // ...
/// }
/// ```
#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = (StatusCode, Json<Value>);

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        // 1. Authorization 헤더에서 토큰 추출
        let token = bearer_token(parts)?;

        // 2. 토큰 검증 + 사용자 로드 (비활성 계정 거부)
        let user = state
            .auth_state
            .auth_service
            .authenticate(token)
            .await?;

        Ok(AuthenticatedUser {
            user_id: user.id,
            username: user.username,
            is_admin: user.is_admin,
        })
    }
}

/// 관리자 전용 Extractor
/// Authenticated user that also carries the admin flag
#[derive(Debug, Clone)]
pub struct AdminUser(pub AuthenticatedUser);

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = (StatusCode, Json<Value>);

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthenticatedUser::from_request_parts(parts, state).await?;

        if !user.is_admin {
            tracing::warn!(user_id = user.user_id, "admin route denied");
            return Err(AuthError::Forbidden.into());
        }

        Ok(AdminUser(user))
    }
}

// "Bearer <token>" 형식 파싱
fn bearer_token(parts: &Parts) -> Result<&str, (StatusCode, Json<Value>)> {
    let auth_header = parts
        .headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingToken)?
        .to_str()
        .map_err(|_| AuthError::InvalidToken)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(AuthError::InvalidToken)?
        .trim();

    if token.is_empty() {
        return Err(AuthError::MissingToken.into());
    }

    Ok(token)
}
