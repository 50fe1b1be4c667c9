// Auth domain state
// 인증 도메인 상태
use std::sync::Arc;

use crate::domains::auth::services::{
    Argon2Hasher, AuthService, JwtService, PasswordHashing, UserService,
};
use crate::shared::config::AppConfig;
use crate::shared::database::CredentialStore;
use crate::shared::utils::Clock;

/// Auth domain state
/// 인증 도메인에서 필요한 서비스들을 포함하는 상태
#[derive(Clone)]
pub struct AuthState {
    pub auth_service: AuthService,
    pub user_service: UserService,
    pub jwt_service: JwtService,
}

impl AuthState {
    /// Create AuthState over a credential store with Argon2 defaults
    pub fn new(store: Arc<dyn CredentialStore>, config: &AppConfig, clock: Arc<dyn Clock>) -> Self {
        Self::with_hasher(store, config, clock, Arc::new(Argon2Hasher::default()))
    }

    /// 해셔 주입 (테스트에서 가벼운 Argon2 파라미터 사용)
    pub fn with_hasher(
        store: Arc<dyn CredentialStore>,
        config: &AppConfig,
        clock: Arc<dyn Clock>,
        hasher: Arc<dyn PasswordHashing>,
    ) -> Self {
        let jwt_service = JwtService::new(&config.jwt, clock.clone());

        Self {
            auth_service: AuthService::new(
                store.clone(),
                jwt_service.clone(),
                hasher,
                clock,
                config.session,
            ),
            user_service: UserService::new(store),
            jwt_service,
        }
    }
}
