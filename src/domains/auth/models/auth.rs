use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domains::auth::models::user::UserUpdate;
use crate::shared::config::PasswordPolicy;
use crate::shared::errors::AuthError;
use crate::shared::utils::{
    require_non_empty, validate_email, validate_password, validate_username,
};

// 회원가입 요청 모델
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[schema(as = RegisterRequest)]
pub struct RegisterRequest {
    /// Username (3-50 chars, alphanumeric, underscore, hyphen)
    /// 사용자명
    #[schema(example = "alice")]
    pub username: String,

    /// Email address
    /// 이메일 주소
    #[schema(example = "alice@example.com")]
    pub email: String,

    /// Password (will be hashed)
    /// 비밀번호 (해싱됨)
    #[schema(example = "Passw0rd1")]
    pub password: String,
}

impl RegisterRequest {
    /// 입력값 검증 후 정규화된 요청 반환
    /// Validate and return the normalised request
    pub fn validate(self, policy: &PasswordPolicy) -> Result<Self, AuthError> {
        let username = validate_username(&self.username)?;
        let email = validate_email(&self.email)?;
        validate_password(&self.password, policy)?;

        Ok(Self {
            username,
            email,
            password: self.password,
        })
    }
}

// 로그인 요청 모델
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[schema(as = LoginRequest)]
pub struct LoginRequest {
    #[schema(example = "alice")]
    pub username: String,

    #[schema(example = "Passw0rd1")]
    pub password: String,
}

impl LoginRequest {
    // 로그인은 형식만 확인 (비밀번호 정책은 가입 시에만 적용)
    pub fn validate(self) -> Result<Self, AuthError> {
        require_non_empty("username", &self.username)?;
        require_non_empty("password", &self.password)?;

        Ok(Self {
            username: self.username.trim().to_string(),
            password: self.password,
        })
    }
}

/// 토큰 응답 모델 (로그인/회원가입/갱신 공통)
/// Access + refresh token pair returned by register, login and refresh
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[schema(as = TokenResponse)]
pub struct TokenResponse {
    /// JWT Access Token (짧은 수명)
    /// JWT Access Token (short lifetime)
    #[schema(example = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9...")]
    pub access_token: String,

    /// Refresh Token (긴 수명, DB에는 해시만 저장)
    /// Refresh Token (long lifetime, only its digest is stored)
    #[schema(example = "q3Zx0V9m1b...")]
    pub refresh_token: String,

    #[schema(example = "bearer")]
    pub token_type: String,

    /// Access token lifetime in seconds
    #[schema(example = 1800)]
    pub expires_in: i64,
}

impl TokenResponse {
    pub fn bearer(access_token: String, refresh_token: String, expires_in: i64) -> Self {
        Self {
            access_token,
            refresh_token,
            token_type: "bearer".to_string(),
            expires_in,
        }
    }
}

/// Token pair as issued by the session manager
pub type TokenPair = TokenResponse;

fn default_rotate() -> bool {
    true
}

// 토큰 갱신 요청 모델
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[schema(as = RefreshTokenRequest)]
pub struct RefreshTokenRequest {
    /// Refresh Token
    /// 리프레시 토큰
    #[schema(example = "q3Zx0V9m1b...")]
    pub refresh_token: String,

    /// Issue a new refresh token and revoke the presented one (default: true)
    #[serde(default = "default_rotate")]
    #[schema(example = true)]
    pub rotate: bool,
}

impl RefreshTokenRequest {
    pub fn validate(self) -> Result<Self, AuthError> {
        require_non_empty("refresh_token", &self.refresh_token)?;
        Ok(self)
    }
}

// 로그아웃 요청 모델
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[schema(as = LogoutRequest)]
pub struct LogoutRequest {
    /// Refresh Token
    /// 리프레시 토큰
    #[schema(example = "q3Zx0V9m1b...")]
    pub refresh_token: String,
}

impl LogoutRequest {
    pub fn validate(self) -> Result<Self, AuthError> {
        require_non_empty("refresh_token", &self.refresh_token)?;
        Ok(self)
    }
}

// 프로필 수정 요청 모델
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[schema(as = UpdateUserRequest)]
pub struct UpdateUserRequest {
    #[schema(example = "alice2")]
    pub username: Option<String>,

    #[schema(example = "alice2@example.com")]
    pub email: Option<String>,
}

impl UpdateUserRequest {
    pub fn validate(self) -> Result<UserUpdate, AuthError> {
        let username = self.username.as_deref().map(validate_username).transpose()?;
        let email = self.email.as_deref().map(validate_email).transpose()?;

        Ok(UserUpdate { username, email })
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[schema(as = MessageResponse)]
pub struct MessageResponse {
    #[schema(example = "Logout successful")]
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

// 전체 로그아웃 응답 모델
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[schema(as = LogoutAllResponse)]
pub struct LogoutAllResponse {
    /// Number of sessions revoked
    #[schema(example = 3)]
    pub revoked_sessions: u64,

    pub message: String,
}
