use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Refresh Token 모델 (DB 저장용)
/// Refresh credential as persisted.
///
/// Only the SHA-256 digest of the opaque token is stored; the raw string
/// is handed to the client once and never kept.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshCredential {
    pub id: i64,
    pub user_id: i64,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub is_revoked: bool,
    pub user_agent: Option<String>,
    pub origin_address: Option<String>,
}

/// Refresh Token 상태
/// Lifecycle state. `Revoked` and `Expired` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialStatus {
    Active,
    Revoked,
    Expired,
}

impl RefreshCredential {
    pub fn status_at(&self, now: DateTime<Utc>) -> CredentialStatus {
        if self.is_revoked {
            CredentialStatus::Revoked
        } else if now > self.expires_at {
            CredentialStatus::Expired
        } else {
            CredentialStatus::Active
        }
    }

    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.status_at(now) == CredentialStatus::Active
    }
}

/// Refresh Token 생성 요청 (새 토큰 발급 시)
/// Refresh credential creation request
#[derive(Debug, Clone)]
pub struct NewRefreshCredential {
    pub user_id: i64,
    pub token_hash: String,
    pub ttl_days: i64,
    pub user_agent: Option<String>,
    pub origin_address: Option<String>,
}

/// 클라이언트 정보 (감사 로그용)
/// Client context recorded with every issued refresh credential
#[derive(Debug, Clone, Default)]
pub struct ClientContext {
    pub user_agent: Option<String>,
    pub origin_address: Option<String>,
}

impl ClientContext {
    pub fn new(user_agent: Option<String>, origin_address: Option<String>) -> Self {
        Self {
            user_agent,
            origin_address,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn credential(is_revoked: bool, expires_in: Duration) -> RefreshCredential {
        let now = Utc::now();
        RefreshCredential {
            id: 1,
            user_id: 1,
            token_hash: "digest".to_string(),
            expires_at: now + expires_in,
            created_at: now,
            is_revoked,
            user_agent: None,
            origin_address: None,
        }
    }

    #[test]
    fn status_reflects_revocation_and_expiry() {
        let now = Utc::now();

        assert_eq!(
            credential(false, Duration::days(1)).status_at(now),
            CredentialStatus::Active
        );
        assert_eq!(
            credential(true, Duration::days(1)).status_at(now),
            CredentialStatus::Revoked
        );
        assert_eq!(
            credential(false, Duration::days(-1)).status_at(now),
            CredentialStatus::Expired
        );
        // 만료 + 무효화 모두 해당하면 무효화가 우선
        assert_eq!(
            credential(true, Duration::days(-1)).status_at(now),
            CredentialStatus::Revoked
        );
    }
}
