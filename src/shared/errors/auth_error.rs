use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

/// 인증 관련 에러
/// Authentication, session and quota errors.
///
/// Every variant except [`AuthError::DatabaseError`] and
/// [`AuthError::Internal`] is a business-rule failure that is surfaced to
/// the caller with a stable code. Those two are infrastructure failures:
/// logged in full, surfaced generically.
#[derive(Error, Debug)]
pub enum AuthError {
    /// 입력값 검증 실패
    /// Malformed input, rejected before any operation runs
    #[error("Validation failed for {field}: {message}")]
    Validation { field: String, message: String },

    /// 사용자명 또는 이메일 중복
    /// Username or email already taken
    #[error("{field} already exists")]
    Conflict { field: String },

    /// 잘못된 사용자명 또는 비밀번호
    /// Unknown user or wrong password (deliberately indistinguishable)
    #[error("Invalid username or password")]
    InvalidCredentials,

    /// 비활성화된 계정
    /// Account is deactivated
    #[error("Account is inactive")]
    InactiveAccount,

    /// 존재하지 않는 Refresh Token
    /// Refresh credential not found or not owned by the caller
    #[error("Invalid refresh token")]
    InvalidRefreshToken,

    #[error("Refresh token has been revoked")]
    RefreshTokenRevoked,

    #[error("Refresh token has expired")]
    RefreshTokenExpired,

    /// 세션 수 초과 (RejectNew 정책일 때만)
    /// Session limit reached under the reject-new policy
    #[error("Maximum number of sessions exceeded: max={max_sessions}")]
    SessionLimitExceeded { max_sessions: usize },

    /// 요청 한도 초과
    /// Request quota exhausted
    #[error("Rate limit exceeded. Try again in {retry_after} seconds")]
    RateLimitExceeded { retry_after: u64 },

    /// 잘못된 Access Token (형식 또는 서명 오류)
    /// Malformed access token or bad signature
    #[error("Invalid token")]
    InvalidToken,

    #[error("Token has expired")]
    AccessTokenExpired,

    #[error("Invalid token type")]
    WrongTokenType,

    /// 토큰이 제공되지 않음
    /// Token not provided
    #[error("Token not provided")]
    MissingToken,

    #[error("Not authorized")]
    Forbidden,

    /// 사용자를 찾을 수 없음
    /// User not found
    #[error("User not found: id={id}")]
    UserNotFound { id: i64 },

    /// 데이터베이스 에러
    /// Credential store failure
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// 내부 서버 에러 (서명 키, 해싱 등)
    /// Codec or hashing failure
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AuthError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        AuthError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn conflict(field: impl Into<String>) -> Self {
        AuthError::Conflict {
            field: field.into(),
        }
    }

    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::Validation { .. } => "VALIDATION_ERROR",
            AuthError::Conflict { .. } => "CONFLICT",
            AuthError::InvalidCredentials => "INVALID_CREDENTIALS",
            AuthError::InactiveAccount => "INACTIVE_ACCOUNT",
            AuthError::InvalidRefreshToken => "INVALID_REFRESH_TOKEN",
            AuthError::RefreshTokenRevoked => "REFRESH_TOKEN_REVOKED",
            AuthError::RefreshTokenExpired => "REFRESH_TOKEN_EXPIRED",
            AuthError::SessionLimitExceeded { .. } => "SESSION_LIMIT_EXCEEDED",
            AuthError::RateLimitExceeded { .. } => "RATE_LIMIT_EXCEEDED",
            AuthError::InvalidToken => "INVALID_TOKEN",
            AuthError::AccessTokenExpired => "TOKEN_EXPIRED",
            AuthError::WrongTokenType => "WRONG_TOKEN_TYPE",
            AuthError::MissingToken => "MISSING_TOKEN",
            AuthError::Forbidden => "FORBIDDEN",
            AuthError::UserNotFound { .. } => "NOT_FOUND",
            AuthError::DatabaseError(_) | AuthError::Internal(_) => "INFRASTRUCTURE_FAILURE",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AuthError::Conflict { .. } | AuthError::SessionLimitExceeded { .. } => {
                StatusCode::CONFLICT
            }
            AuthError::InvalidCredentials
            | AuthError::InvalidRefreshToken
            | AuthError::RefreshTokenRevoked
            | AuthError::RefreshTokenExpired
            | AuthError::InvalidToken
            | AuthError::AccessTokenExpired
            | AuthError::WrongTokenType
            | AuthError::MissingToken => StatusCode::UNAUTHORIZED,
            AuthError::InactiveAccount | AuthError::Forbidden => StatusCode::FORBIDDEN,
            AuthError::RateLimitExceeded { .. } => StatusCode::TOO_MANY_REQUESTS,
            AuthError::UserNotFound { .. } => StatusCode::NOT_FOUND,
            AuthError::DatabaseError(_) | AuthError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn is_infrastructure(&self) -> bool {
        matches!(self, AuthError::DatabaseError(_) | AuthError::Internal(_))
    }

    fn details(&self) -> Value {
        match self {
            AuthError::Validation { field, .. } | AuthError::Conflict { field } => {
                json!({ "field": field })
            }
            AuthError::SessionLimitExceeded { max_sessions } => {
                json!({ "max_sessions": max_sessions })
            }
            AuthError::RateLimitExceeded { retry_after } => json!({ "retry_after": retry_after }),
            _ => json!({}),
        }
    }
}

/// AuthError를 HTTP 응답으로 변환
/// Infrastructure failures are logged here and never leak their detail.
impl From<AuthError> for (StatusCode, Json<Value>) {
    fn from(err: AuthError) -> Self {
        let status = err.status_code();

        let message = if err.is_infrastructure() {
            tracing::error!(error = %err, code = err.code(), "infrastructure failure");
            "Internal server error".to_string()
        } else {
            err.to_string()
        };

        (
            status,
            Json(json!({
                "error": message,
                "code": err.code(),
                "details": err.details(),
            })),
        )
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let retry_after = match &self {
            AuthError::RateLimitExceeded { retry_after } => Some(*retry_after),
            _ => None,
        };

        let (status, body): (StatusCode, Json<Value>) = self.into();
        let mut response = (status, body).into_response();

        if let Some(secs) = retry_after {
            if let Ok(value) = HeaderValue::from_str(&secs.to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }

        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infrastructure_errors_do_not_leak_detail() {
        let (status, Json(body)) =
            <(StatusCode, Json<Value>)>::from(AuthError::DatabaseError("pool timed out".into()));

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["code"], "INFRASTRUCTURE_FAILURE");
        assert_eq!(body["error"], "Internal server error");
    }

    #[test]
    fn rate_limit_response_carries_retry_after_header() {
        let response = AuthError::RateLimitExceeded { retry_after: 42 }.into_response();

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[header::RETRY_AFTER], "42");
    }

    #[test]
    fn conflict_names_the_colliding_field() {
        let (status, Json(body)) = <(StatusCode, Json<Value>)>::from(AuthError::conflict("email"));

        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "CONFLICT");
        assert_eq!(body["details"]["field"], "email");
    }
}
