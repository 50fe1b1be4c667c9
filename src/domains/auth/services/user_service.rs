use std::sync::Arc;

use crate::domains::auth::models::{User, UserUpdate};
use crate::shared::database::CredentialStore;
use crate::shared::errors::AuthError;
use crate::shared::utils::mask_sensitive;

// 사용자 프로필 서비스
// UserService: profile updates and account deactivation
#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn CredentialStore>,
}

impl UserService {
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self { store }
    }

    /// 프로필 수정 (사용자명 / 이메일)
    /// Change username and/or email. Values must already be validated.
    pub async fn update_profile(&self, user_id: i64, update: UserUpdate) -> Result<User, AuthError> {
        if update.is_empty() {
            return Err(AuthError::validation(
                "body",
                "At least one of username or email must be provided",
            ));
        }

        // 다른 사용자가 이미 사용 중인지 확인
        if let Some(username) = &update.username {
            if let Some(existing) = self.store.find_user_by_username(username).await? {
                if existing.id != user_id {
                    return Err(AuthError::conflict("username"));
                }
            }
        }
        if let Some(email) = &update.email {
            if let Some(existing) = self.store.find_user_by_email(email).await? {
                if existing.id != user_id {
                    return Err(AuthError::conflict("email"));
                }
            }
        }

        let user = self
            .store
            .update_user(user_id, &update)
            .await?
            .ok_or(AuthError::UserNotFound { id: user_id })?;

        tracing::info!(
            user_id = user.id,
            username = %user.username,
            email = %mask_sensitive(&user.email, 3),
            "user profile updated"
        );
        Ok(user)
    }

    /// 계정 비활성화 (소프트 삭제) + 모든 세션 종료
    /// Soft-delete the account and revoke every refresh credential
    pub async fn deactivate_account(&self, user_id: i64) -> Result<(), AuthError> {
        if !self.store.deactivate_user(user_id).await? {
            return Err(AuthError::UserNotFound { id: user_id });
        }

        let revoked = self.store.revoke_all_refresh_credentials(user_id).await?;
        tracing::info!(
            user_id = user_id,
            revoked_sessions = revoked,
            "user account deactivated"
        );
        Ok(())
    }
}
