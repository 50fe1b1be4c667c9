use anyhow::{Context, Result};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use crate::domains::auth::models::refresh_token::{NewRefreshCredential, RefreshCredential};

const CREDENTIAL_COLUMNS: &str =
    "id, user_id, token_hash, expires_at, created_at, is_revoked, user_agent, origin_address";

const INSERT_CREDENTIAL: &str = r#"
    INSERT INTO refresh_tokens
        (user_id, token_hash, expires_at, is_revoked, user_agent, origin_address, created_at, updated_at)
    VALUES ($1, $2, NOW() + make_interval(days => $3), FALSE, $4, $5, NOW(), NOW())
    RETURNING id, user_id, token_hash, expires_at, created_at, is_revoked, user_agent, origin_address
"#;

/// Refresh Token Repository
/// Refresh Token 데이터베이스 작업 처리
pub struct RefreshTokenRepository {
    pool: PgPool,
}

impl RefreshTokenRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn map_row(row: &PgRow) -> RefreshCredential {
        RefreshCredential {
            id: row.get("id"),
            user_id: row.get("user_id"),
            token_hash: row.get("token_hash"),
            expires_at: row.get("expires_at"),
            created_at: row.get("created_at"),
            is_revoked: row.get("is_revoked"),
            user_agent: row.get("user_agent"),
            origin_address: row.get("origin_address"),
        }
    }

    /// Refresh Token 생성 (저장)
    /// Create and store refresh token
    pub async fn create(&self, data: NewRefreshCredential) -> Result<RefreshCredential> {
        let row = sqlx::query(INSERT_CREDENTIAL)
            .bind(data.user_id)
            .bind(&data.token_hash)
            .bind(data.ttl_days as i32)
            .bind(&data.user_agent)
            .bind(&data.origin_address)
            .fetch_one(&self.pool)
            .await
            .context("Failed to create refresh token")?;

        Ok(Self::map_row(&row))
    }

    /// Refresh Token 조회 (token_hash로)
    /// Find refresh token by token hash
    pub async fn find_by_token_hash(&self, token_hash: &str) -> Result<Option<RefreshCredential>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM refresh_tokens WHERE token_hash = $1",
            CREDENTIAL_COLUMNS
        ))
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to find refresh token")?;

        Ok(row.as_ref().map(Self::map_row))
    }

    /// Refresh Token 무효화 (is_revoked = true)
    /// Revoke refresh token
    pub async fn revoke(&self, token_hash: &str) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE refresh_tokens
            SET is_revoked = TRUE, updated_at = NOW()
            WHERE token_hash = $1
            "#,
        )
        .bind(token_hash)
        .execute(&self.pool)
        .await
        .context("Failed to revoke refresh token")?;

        Ok(())
    }

    /// Refresh Token 교체 (Rotation)
    /// Revoke the old token and insert the new one in one transaction.
    /// Nothing is written when the old token is no longer active.
    pub async fn rotate(
        &self,
        old_token_hash: &str,
        data: NewRefreshCredential,
    ) -> Result<Option<RefreshCredential>> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin rotation transaction")?;

        let revoked = sqlx::query(
            r#"
            UPDATE refresh_tokens
            SET is_revoked = TRUE, updated_at = NOW()
            WHERE token_hash = $1 AND is_revoked = FALSE AND expires_at > NOW()
            "#,
        )
        .bind(old_token_hash)
        .execute(&mut tx)
        .await
        .context("Failed to revoke rotated refresh token")?;

        if revoked.rows_affected() != 1 {
            tx.rollback()
                .await
                .context("Failed to roll back rotation transaction")?;
            return Ok(None);
        }

        let row = sqlx::query(INSERT_CREDENTIAL)
            .bind(data.user_id)
            .bind(&data.token_hash)
            .bind(data.ttl_days as i32)
            .bind(&data.user_agent)
            .bind(&data.origin_address)
            .fetch_one(&mut tx)
            .await
            .context("Failed to create rotated refresh token")?;

        tx.commit()
            .await
            .context("Failed to commit rotation transaction")?;

        Ok(Some(Self::map_row(&row)))
    }

    /// 사용자의 유효한 Refresh Token 목록 (오래된 순)
    /// Active refresh tokens for a user, oldest first
    pub async fn list_active_for_user(&self, user_id: i64) -> Result<Vec<RefreshCredential>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {}
            FROM refresh_tokens
            WHERE user_id = $1 AND is_revoked = FALSE AND expires_at > NOW()
            ORDER BY created_at ASC, id ASC
            "#,
            CREDENTIAL_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list active refresh tokens")?;

        Ok(rows.iter().map(Self::map_row).collect())
    }

    /// 사용자의 모든 Refresh Token 무효화 (전체 로그아웃 시)
    /// Revoke all refresh tokens for a user
    pub async fn revoke_all_for_user(&self, user_id: i64) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE refresh_tokens
            SET is_revoked = TRUE, updated_at = NOW()
            WHERE user_id = $1 AND is_revoked = FALSE AND expires_at > NOW()
            "#,
        )
        .bind(user_id)
        .execute(&self.pool)
        .await
        .context("Failed to revoke all refresh tokens for user")?;

        Ok(result.rows_affected())
    }
}
