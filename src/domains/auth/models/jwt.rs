use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::shared::errors::AuthError;

pub const ACCESS_TOKEN_TYPE: &str = "access";

/// Claim names the codec owns; extra claims may not override them
pub const RESERVED_CLAIMS: [&str; 4] = ["sub", "iat", "exp", "type"];

/// JWT Claims (토큰에 포함될 데이터)
/// JWT Claims (data to be included in token)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    /// 사용자 ID (문자열)
    /// Subject id
    pub sub: String,

    /// 발급 시간 (Unix timestamp)
    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// 만료 시간 (Unix timestamp)
    /// Expiration time (Unix timestamp)
    pub exp: i64,

    #[serde(rename = "type")]
    pub token_type: String,

    /// 추가 클레임 (예: username)
    /// Caller-supplied claims
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Claims {
    pub fn user_id(&self) -> Result<i64, AuthError> {
        self.sub.parse().map_err(|_| AuthError::InvalidToken)
    }

    pub fn username(&self) -> Option<&str> {
        self.extra.get("username").and_then(Value::as_str)
    }
}
