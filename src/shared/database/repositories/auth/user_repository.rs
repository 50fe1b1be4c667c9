use anyhow::{Context, Result};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use crate::domains::auth::models::user::{User, UserUpdate};

const USER_COLUMNS: &str =
    "id, username, email, password_hash, is_active, is_admin, created_at, updated_at";

/// User Repository
/// users 테이블 작업 처리
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn map_row(row: &PgRow) -> User {
        User {
            id: row.get("id"),
            username: row.get("username"),
            email: row.get("email"),
            password_hash: row.get("password_hash"),
            is_active: row.get("is_active"),
            is_admin: row.get("is_admin"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        }
    }

    pub async fn create_user(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<User> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO users (username, email, password_hash, is_active, is_admin, created_at, updated_at)
            VALUES ($1, $2, $3, TRUE, FALSE, NOW(), NOW())
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await
        .context("Failed to create user")?;

        Ok(Self::map_row(&row))
    }

    // 사용자명으로 사용자 조회 (로그인용)
    // Get user by username (for login)
    pub async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM users WHERE username = $1",
            USER_COLUMNS
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch user by username")?;

        Ok(row.as_ref().map(Self::map_row))
    }

    // 이메일로 사용자 조회
    // Get user by email
    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM users WHERE email = $1",
            USER_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch user by email")?;

        Ok(row.as_ref().map(Self::map_row))
    }

    // ID로 사용자 조회
    // Get user by ID
    pub async fn get_user_by_id(&self, id: i64) -> Result<Option<User>> {
        let row = sqlx::query(&format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch user by id")?;

        Ok(row.as_ref().map(Self::map_row))
    }

    /// 프로필 수정 (NULL이면 기존 값 유지)
    /// Update profile fields; `None` keeps the current value
    pub async fn update_user(&self, id: i64, update: &UserUpdate) -> Result<Option<User>> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE users
            SET username = COALESCE($2, username),
                email = COALESCE($3, email),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(id)
        .bind(update.username.as_deref())
        .bind(update.email.as_deref())
        .fetch_optional(&self.pool)
        .await
        .context("Failed to update user")?;

        Ok(row.as_ref().map(Self::map_row))
    }

    /// 소프트 삭제
    /// Soft delete (is_active = FALSE)
    pub async fn deactivate_user(&self, id: i64) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET is_active = FALSE, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .context("Failed to deactivate user")?;

        Ok(result.rows_affected() > 0)
    }
}
