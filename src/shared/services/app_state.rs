use std::sync::Arc;

use anyhow::Result;

use crate::domains::auth::services::state::AuthState;
use crate::domains::auth::services::PasswordHashing;
use crate::shared::config::AppConfig;
use crate::shared::database::{CredentialStore, Database, InMemoryCredentialStore, PgCredentialStore};
use crate::shared::rate_limit::{RateLimitPolicy, RateLimiter};
use crate::shared::utils::{Clock, SystemClock};

/// Application state (combines all domain states)
/// 애플리케이션 상태 (모든 도메인 상태를 조합)
///
/// 요청 제한기는 프로세스 전체에서 하나의 인스턴스를 공유
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub auth_state: AuthState,
    /// readiness 확인용
    pub store: Arc<dyn CredentialStore>,
    pub rate_limiter: Arc<RateLimiter>,
    pub rate_limit_policy: Arc<RateLimitPolicy>,
}

impl AppState {
    /// Build state over any credential store
    pub fn new(config: AppConfig, store: Arc<dyn CredentialStore>, clock: Arc<dyn Clock>) -> Self {
        let auth_state = AuthState::new(store.clone(), &config, clock.clone());
        Self::assemble(config, auth_state, store, clock)
    }

    /// 해셔 주입 (테스트용)
    pub fn with_hasher(
        config: AppConfig,
        store: Arc<dyn CredentialStore>,
        clock: Arc<dyn Clock>,
        hasher: Arc<dyn PasswordHashing>,
    ) -> Self {
        let auth_state = AuthState::with_hasher(store.clone(), &config, clock.clone(), hasher);
        Self::assemble(config, auth_state, store, clock)
    }

    /// DATABASE_URL이 있으면 PostgreSQL, 없으면 메모리 저장소
    /// Connect to Postgres when configured, otherwise fall back to the
    /// in-process store.
    pub async fn from_config(config: AppConfig) -> Result<Self> {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);

        let store: Arc<dyn CredentialStore> = match config.database_url.as_deref() {
            Some(url) => {
                let db = Database::new(url).await?;
                db.initialize().await?;
                tracing::info!("using PostgreSQL credential store");
                Arc::new(PgCredentialStore::new(&db))
            }
            None => {
                tracing::warn!("DATABASE_URL not set, using in-memory credential store");
                Arc::new(InMemoryCredentialStore::new(clock.clone()))
            }
        };

        Ok(Self::new(config, store, clock))
    }

    fn assemble(
        config: AppConfig,
        auth_state: AuthState,
        store: Arc<dyn CredentialStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let rate_limit_policy = RateLimitPolicy::from_settings(&config.rate_limit);

        Self {
            config: Arc::new(config),
            auth_state,
            store,
            rate_limiter: Arc::new(RateLimiter::with_clock(clock)),
            rate_limit_policy: Arc::new(rate_limit_policy),
        }
    }
}
