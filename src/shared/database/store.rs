use async_trait::async_trait;
use thiserror::Error;

use crate::domains::auth::models::{NewRefreshCredential, RefreshCredential, User, UserUpdate};
use crate::shared::errors::AuthError;

/// 저장소 에러
/// Credential store failure
#[derive(Error, Debug)]
pub enum StoreError {
    /// 유니크 제약 위반 (username, email, token)
    /// Unique constraint violated
    #[error("{field} already exists")]
    Duplicate { field: &'static str },

    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

/// 인증 저장소 인터페이스
/// Durable record of users and issued refresh credentials.
///
/// Each method is individually atomic. Refresh credentials are addressed
/// by the digest of their token, never by the raw token.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    async fn find_user_by_id(&self, id: i64) -> Result<Option<User>, StoreError>;

    /// Fails with [`StoreError::Duplicate`] when username or email is taken.
    async fn create_user(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<User, StoreError>;

    /// `Ok(None)` when no such user exists
    async fn update_user(&self, id: i64, update: &UserUpdate) -> Result<Option<User>, StoreError>;

    /// 소프트 삭제 (is_active = false). 사용자가 없으면 false
    async fn deactivate_user(&self, id: i64) -> Result<bool, StoreError>;

    async fn find_refresh_credential(
        &self,
        token_hash: &str,
    ) -> Result<Option<RefreshCredential>, StoreError>;

    async fn create_refresh_credential(
        &self,
        data: NewRefreshCredential,
    ) -> Result<RefreshCredential, StoreError>;

    /// Idempotent: revoking a revoked credential is a no-op
    async fn revoke_refresh_credential(&self, token_hash: &str) -> Result<(), StoreError>;

    /// Refresh Token 교체 (무효화 + 생성을 하나의 트랜잭션으로)
    /// Revoke `old_token_hash` and persist `data` as one unit.
    ///
    /// Returns `Ok(None)` without writing anything when the old credential
    /// is no longer active, so two concurrent rotations of the same
    /// credential cannot both succeed.
    async fn rotate_refresh_credential(
        &self,
        old_token_hash: &str,
        data: NewRefreshCredential,
    ) -> Result<Option<RefreshCredential>, StoreError>;

    /// Non-revoked, non-expired credentials of a user, oldest first
    async fn list_active_refresh_credentials(
        &self,
        user_id: i64,
    ) -> Result<Vec<RefreshCredential>, StoreError>;

    /// 사용자의 모든 Refresh Token 무효화, 무효화된 개수 반환
    async fn revoke_all_refresh_credentials(&self, user_id: i64) -> Result<u64, StoreError>;

    /// 저장소 연결 확인 (readiness)
    async fn ping(&self) -> Result<(), StoreError>;
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate { field } => AuthError::conflict(field),
            StoreError::Backend(e) => AuthError::DatabaseError(format!("{:#}", e)),
        }
    }
}
