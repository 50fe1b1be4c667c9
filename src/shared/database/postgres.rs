use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;

use crate::domains::auth::models::{NewRefreshCredential, RefreshCredential, User, UserUpdate};
use crate::shared::database::connection::Database;
use crate::shared::database::repositories::{RefreshTokenRepository, UserRepository};
use crate::shared::database::store::{CredentialStore, StoreError};

/// PostgreSQL 기반 인증 저장소
/// Credential store backed by the `users` and `refresh_tokens` tables
pub struct PgCredentialStore {
    pool: PgPool,
    users: UserRepository,
    refresh_tokens: RefreshTokenRepository,
}

impl PgCredentialStore {
    pub fn new(db: &Database) -> Self {
        Self {
            pool: db.pool().clone(),
            users: UserRepository::new(db.pool().clone()),
            refresh_tokens: RefreshTokenRepository::new(db.pool().clone()),
        }
    }
}

// 유니크 제약 위반을 Duplicate 에러로 변환
fn map_unique_violation(err: anyhow::Error) -> StoreError {
    if let Some(sqlx::Error::Database(db_err)) = err.downcast_ref::<sqlx::Error>() {
        let field = match db_err.constraint() {
            Some("users_username_key") => Some("username"),
            Some("users_email_key") => Some("email"),
            Some("refresh_tokens_token_hash_key") => Some("token"),
            _ => None,
        };
        if let Some(field) = field {
            return StoreError::Duplicate { field };
        }
    }
    StoreError::Backend(err)
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .context("Database ping failed")?;
        Ok(())
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        Ok(self.users.get_user_by_username(username).await?)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self.users.get_user_by_email(email).await?)
    }

    async fn find_user_by_id(&self, id: i64) -> Result<Option<User>, StoreError> {
        Ok(self.users.get_user_by_id(id).await?)
    }

    async fn create_user(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<User, StoreError> {
        self.users
            .create_user(username, email, password_hash)
            .await
            .map_err(map_unique_violation)
    }

    async fn update_user(&self, id: i64, update: &UserUpdate) -> Result<Option<User>, StoreError> {
        self.users
            .update_user(id, update)
            .await
            .map_err(map_unique_violation)
    }

    async fn deactivate_user(&self, id: i64) -> Result<bool, StoreError> {
        Ok(self.users.deactivate_user(id).await?)
    }

    async fn find_refresh_credential(
        &self,
        token_hash: &str,
    ) -> Result<Option<RefreshCredential>, StoreError> {
        Ok(self.refresh_tokens.find_by_token_hash(token_hash).await?)
    }

    async fn create_refresh_credential(
        &self,
        data: NewRefreshCredential,
    ) -> Result<RefreshCredential, StoreError> {
        self.refresh_tokens
            .create(data)
            .await
            .map_err(map_unique_violation)
    }

    async fn revoke_refresh_credential(&self, token_hash: &str) -> Result<(), StoreError> {
        Ok(self.refresh_tokens.revoke(token_hash).await?)
    }

    async fn rotate_refresh_credential(
        &self,
        old_token_hash: &str,
        data: NewRefreshCredential,
    ) -> Result<Option<RefreshCredential>, StoreError> {
        self.refresh_tokens
            .rotate(old_token_hash, data)
            .await
            .map_err(map_unique_violation)
    }

    async fn list_active_refresh_credentials(
        &self,
        user_id: i64,
    ) -> Result<Vec<RefreshCredential>, StoreError> {
        Ok(self.refresh_tokens.list_active_for_user(user_id).await?)
    }

    async fn revoke_all_refresh_credentials(&self, user_id: i64) -> Result<u64, StoreError> {
        Ok(self.refresh_tokens.revoke_all_for_user(user_id).await?)
    }
}
