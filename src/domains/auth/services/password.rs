use std::sync::OnceLock;

use argon2::password_hash::{rand_core::OsRng, SaltString};
use argon2::{Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version};

use crate::shared::errors::AuthError;

/// 비밀번호 해싱 인터페이스
/// Password hashing seam; production uses Argon2id
pub trait PasswordHashing: Send + Sync {
    fn hash(&self, password: &str) -> Result<String, AuthError>;

    /// `Ok(false)` on mismatch, `Err` only when the stored hash is unusable
    fn verify(&self, password: &str, password_hash: &str) -> Result<bool, AuthError>;

    /// 존재하지 않는 사용자 로그인 시 동일한 비용의 검증 수행 (타이밍 평탄화)
    /// Spend one verification's worth of work against a throwaway hash
    fn verify_dummy(&self, password: &str);
}

/// Argon2id hasher
pub struct Argon2Hasher {
    argon2: Argon2<'static>,
    dummy_hash: OnceLock<Option<String>>,
}

impl Default for Argon2Hasher {
    fn default() -> Self {
        Self {
            argon2: Argon2::default(),
            dummy_hash: OnceLock::new(),
        }
    }
}

impl Argon2Hasher {
    /// 커스텀 파라미터 (테스트에서는 가벼운 값 사용)
    pub fn with_params(params: Params) -> Self {
        Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
            dummy_hash: OnceLock::new(),
        }
    }
}

impl PasswordHashing for Argon2Hasher {
    fn hash(&self, password: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);

        let password_hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AuthError::Internal(format!("Failed to hash password: {}", e)))?
            .to_string();

        Ok(password_hash)
    }

    fn verify(&self, password: &str, password_hash: &str) -> Result<bool, AuthError> {
        let parsed_hash = PasswordHash::new(password_hash)
            .map_err(|e| AuthError::Internal(format!("Invalid password hash: {}", e)))?;

        match self.argon2.verify_password(password.as_bytes(), &parsed_hash) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(AuthError::Internal(format!(
                "Failed to verify password: {}",
                e
            ))),
        }
    }

    fn verify_dummy(&self, password: &str) {
        let dummy = self
            .dummy_hash
            .get_or_init(|| self.hash("dummy-password-for-timing").ok());

        if let Some(hash) = dummy {
            let _ = self.verify(password, hash);
        }
    }
}
