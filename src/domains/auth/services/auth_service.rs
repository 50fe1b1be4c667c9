use std::sync::Arc;

use crate::domains::auth::models::{
    ClientContext, CredentialStatus, NewRefreshCredential, TokenPair, User,
};
use crate::domains::auth::services::{JwtService, PasswordHashing};
use crate::shared::config::{SessionConfig, SessionLimitPolicy};
use crate::shared::database::CredentialStore;
use crate::shared::errors::AuthError;
use crate::shared::utils::{mask_sensitive, Clock};

// 인증 서비스 (세션 관리자)
// AuthService: registration, login, refresh rotation, logout, session limits
#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn CredentialStore>,
    jwt_service: JwtService,
    hasher: Arc<dyn PasswordHashing>,
    clock: Arc<dyn Clock>,
    session: SessionConfig,
}

impl AuthService {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        jwt_service: JwtService,
        hasher: Arc<dyn PasswordHashing>,
        clock: Arc<dyn Clock>,
        session: SessionConfig,
    ) -> Self {
        Self {
            store,
            jwt_service,
            hasher,
            clock,
            session,
        }
    }

    pub fn jwt_service(&self) -> &JwtService {
        &self.jwt_service
    }

    // 회원가입 (비즈니스 로직)
    // Inputs are expected to be validated and normalised by the caller.
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
        ctx: ClientContext,
    ) -> Result<TokenPair, AuthError> {
        // 1. 사용자명 / 이메일 중복 확인
        if self.store.find_user_by_username(username).await?.is_some() {
            tracing::info!(username = %username, "registration rejected: username taken");
            return Err(AuthError::conflict("username"));
        }
        if self.store.find_user_by_email(email).await?.is_some() {
            tracing::info!(email = %mask_sensitive(email, 3), "registration rejected: email taken");
            return Err(AuthError::conflict("email"));
        }

        // 2. 비밀번호 해싱
        let password_hash = self.hasher.hash(password)?;

        // 3. 사용자 생성 (동시 가입 경합 시 저장소의 유니크 제약이 Conflict로 변환됨)
        let user = self.store.create_user(username, email, &password_hash).await?;

        tracing::info!(
            user_id = user.id,
            username = %user.username,
            email = %mask_sensitive(&user.email, 3),
            "user registered"
        );

        // 4. 토큰 발급
        self.issue_session(&user, ctx).await
    }

    // 로그인 (비즈니스 로직)
    pub async fn login(
        &self,
        username: &str,
        password: &str,
        ctx: ClientContext,
    ) -> Result<TokenPair, AuthError> {
        // 1. 사용자 조회
        let Some(user) = self.store.find_user_by_username(username).await? else {
            // 존재하지 않는 사용자도 동일한 비용을 들여 응답 시간 차이를 줄임
            self.hasher.verify_dummy(password);
            tracing::warn!(
                username = %username,
                origin = ctx.origin_address.as_deref().unwrap_or("unknown"),
                "login failed: user not found"
            );
            return Err(AuthError::InvalidCredentials);
        };

        // 2. 비밀번호 검증
        if !self.hasher.verify(password, &user.password_hash)? {
            tracing::warn!(
                user_id = user.id,
                origin = ctx.origin_address.as_deref().unwrap_or("unknown"),
                "login failed: invalid password"
            );
            return Err(AuthError::InvalidCredentials);
        }

        // 3. 계정 상태 확인
        if !user.is_active {
            tracing::warn!(user_id = user.id, "login failed: account inactive");
            return Err(AuthError::InactiveAccount);
        }

        let tokens = self.issue_session(&user, ctx).await?;
        tracing::info!(user_id = user.id, "user logged in");
        Ok(tokens)
    }

    /// Refresh Token 검증 및 새 Access Token 발급
    /// Exchange a refresh credential for a new access token.
    ///
    /// With `rotate` the presented credential is revoked and replaced in
    /// one store transaction; a second use of the same credential, even a
    /// concurrent one, fails with [`AuthError::RefreshTokenRevoked`].
    /// Without `rotate` the same refresh string is handed back.
    pub async fn refresh(
        &self,
        refresh_token: &str,
        ctx: ClientContext,
        rotate: bool,
    ) -> Result<TokenPair, AuthError> {
        // 1. Refresh Token 해싱 후 조회
        let token_hash = self.jwt_service.hash_refresh_token(refresh_token);
        let stored = self
            .store
            .find_refresh_credential(&token_hash)
            .await?
            .ok_or(AuthError::InvalidRefreshToken)?;

        // 2. 토큰 상태 확인
        match stored.status_at(self.clock.now()) {
            CredentialStatus::Active => {}
            CredentialStatus::Revoked => {
                tracing::warn!(
                    user_id = stored.user_id,
                    credential_id = stored.id,
                    "revoked refresh token presented"
                );
                return Err(AuthError::RefreshTokenRevoked);
            }
            CredentialStatus::Expired => return Err(AuthError::RefreshTokenExpired),
        }

        // 3. 사용자 확인
        let user = self
            .store
            .find_user_by_id(stored.user_id)
            .await?
            .ok_or(AuthError::InvalidRefreshToken)?;
        if !user.is_active {
            return Err(AuthError::InactiveAccount);
        }

        // 4. 새 Access Token 생성
        let access_token = self.jwt_service.generate_access_token(&user)?;
        let expires_in = self.jwt_service.access_token_ttl().num_seconds();

        if !rotate {
            tracing::debug!(user_id = user.id, "access token refreshed without rotation");
            return Ok(TokenPair::bearer(
                access_token,
                refresh_token.to_string(),
                expires_in,
            ));
        }

        // 5. Rotation: 기존 토큰 무효화 + 새 토큰 저장 (단일 트랜잭션)
        self.enforce_session_limit(user.id, Some(&token_hash)).await?;

        let new_refresh_token = self.jwt_service.generate_refresh_token();
        let rotated = self
            .store
            .rotate_refresh_credential(
                &token_hash,
                self.new_credential(user.id, &new_refresh_token, ctx),
            )
            .await?;

        if rotated.is_none() {
            // 동시에 같은 토큰으로 갱신한 다른 요청이 먼저 성공함
            tracing::warn!(
                user_id = user.id,
                credential_id = stored.id,
                "refresh token replay lost rotation race"
            );
            return Err(AuthError::RefreshTokenRevoked);
        }

        tracing::info!(user_id = user.id, "refresh token rotated");
        Ok(TokenPair::bearer(access_token, new_refresh_token, expires_in))
    }

    /// 로그아웃 - Refresh Token 무효화
    /// Revoke one refresh credential owned by `user_id`. Idempotent.
    pub async fn logout(&self, refresh_token: &str, user_id: i64) -> Result<(), AuthError> {
        let token_hash = self.jwt_service.hash_refresh_token(refresh_token);

        let stored = self
            .store
            .find_refresh_credential(&token_hash)
            .await?
            .ok_or(AuthError::InvalidRefreshToken)?;

        if stored.user_id != user_id {
            tracing::warn!(
                user_id = user_id,
                owner_id = stored.user_id,
                "logout attempted with another user's refresh token"
            );
            return Err(AuthError::InvalidRefreshToken);
        }

        if stored.is_revoked {
            tracing::debug!(user_id = user_id, "logout of already revoked session");
            return Ok(());
        }

        self.store.revoke_refresh_credential(&token_hash).await?;
        tracing::info!(user_id = user_id, credential_id = stored.id, "user logged out");
        Ok(())
    }

    /// 사용자의 모든 Refresh Token 무효화 (모든 기기에서 로그아웃)
    /// Revoke all refresh tokens for user (logout from all devices)
    pub async fn logout_all_devices(&self, user_id: i64) -> Result<u64, AuthError> {
        let revoked = self.store.revoke_all_refresh_credentials(user_id).await?;
        tracing::info!(user_id = user_id, revoked_sessions = revoked, "logged out of all devices");
        Ok(revoked)
    }

    pub async fn get_user_info(&self, user_id: i64) -> Result<User, AuthError> {
        let user = self
            .store
            .find_user_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound { id: user_id })?;

        if !user.is_active {
            return Err(AuthError::InactiveAccount);
        }

        Ok(user)
    }

    /// Access Token 검증 후 사용자 로드
    /// Resolve a bearer access token to an active user
    pub async fn authenticate(&self, access_token: &str) -> Result<User, AuthError> {
        let claims = self.jwt_service.verify_access_token(access_token)?;
        let user_id = claims.user_id()?;

        let user = self
            .store
            .find_user_by_id(user_id)
            .await?
            .ok_or(AuthError::InvalidToken)?;

        if !user.is_active {
            return Err(AuthError::InactiveAccount);
        }

        Ok(user)
    }

    // 새 세션 발급: Access Token + 세션 한도 적용 + Refresh Token 저장
    async fn issue_session(&self, user: &User, ctx: ClientContext) -> Result<TokenPair, AuthError> {
        let access_token = self.jwt_service.generate_access_token(user)?;

        self.enforce_session_limit(user.id, None).await?;

        let refresh_token = self.jwt_service.generate_refresh_token();
        self.store
            .create_refresh_credential(self.new_credential(user.id, &refresh_token, ctx))
            .await?;

        Ok(TokenPair::bearer(
            access_token,
            refresh_token,
            self.jwt_service.access_token_ttl().num_seconds(),
        ))
    }

    /// 세션 수 제한 적용
    /// Make room for one more active credential. `replacing` is the digest
    /// of a credential about to be rotated out and does not count.
    async fn enforce_session_limit(
        &self,
        user_id: i64,
        replacing: Option<&str>,
    ) -> Result<(), AuthError> {
        let max_sessions = self.session.max_sessions;
        if max_sessions == 0 {
            return Ok(());
        }

        let active: Vec<_> = self
            .store
            .list_active_refresh_credentials(user_id)
            .await?
            .into_iter()
            .filter(|c| Some(c.token_hash.as_str()) != replacing)
            .collect();

        if active.len() < max_sessions {
            return Ok(());
        }

        match self.session.limit_policy {
            SessionLimitPolicy::RejectNew => {
                tracing::warn!(
                    user_id = user_id,
                    active_sessions = active.len(),
                    max_sessions = max_sessions,
                    "session limit reached"
                );
                Err(AuthError::SessionLimitExceeded { max_sessions })
            }
            SessionLimitPolicy::EvictOldest => {
                // 오래된 순으로 정렬되어 있음
                let excess = active.len() + 1 - max_sessions;
                for credential in active.iter().take(excess) {
                    self.store
                        .revoke_refresh_credential(&credential.token_hash)
                        .await?;
                    tracing::info!(
                        user_id = user_id,
                        credential_id = credential.id,
                        "evicted oldest session"
                    );
                }
                Ok(())
            }
        }
    }

    fn new_credential(
        &self,
        user_id: i64,
        refresh_token: &str,
        ctx: ClientContext,
    ) -> NewRefreshCredential {
        NewRefreshCredential {
            user_id,
            token_hash: self.jwt_service.hash_refresh_token(refresh_token),
            ttl_days: self.session.refresh_token_ttl_days,
            user_agent: ctx.user_agent,
            origin_address: ctx.origin_address,
        }
    }
}
