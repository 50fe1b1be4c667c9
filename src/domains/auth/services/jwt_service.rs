// src/domains/auth/services/jwt_service.rs
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use std::sync::Arc;

use chrono::Duration;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::rngs::OsRng;
use rand::RngCore;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use crate::domains::auth::models::jwt::{Claims, ACCESS_TOKEN_TYPE, RESERVED_CLAIMS};
use crate::domains::auth::models::user::User;
use crate::shared::config::JwtConfig;
use crate::shared::errors::AuthError;
use crate::shared::utils::Clock;

/// Opaque credential entropy (bytes)
const OPAQUE_CREDENTIAL_BYTES: usize = 32;

/// JWT 서비스
/// Token codec: signs and verifies access tokens, mints opaque credentials.
///
/// Stateless apart from the process-wide key material. `iat`/`exp` are
/// stamped and checked against the injected clock, the same one that
/// ages refresh credentials.
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    algorithm: Algorithm,
    access_token_ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl JwtService {
    /// JWT Service 생성
    /// Create JWT Service
    pub fn new(config: &JwtConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            algorithm: config.algorithm,
            access_token_ttl: Duration::minutes(config.access_token_ttl_minutes),
            clock,
        }
    }

    pub fn access_token_ttl(&self) -> Duration {
        self.access_token_ttl
    }

    /// Access Token 발급
    /// Sign an access token for `subject_id` valid for `ttl`.
    ///
    /// Extra claims named like a reserved claim (`sub`, `iat`, `exp`,
    /// `type`) are dropped.
    pub fn issue_access_token(
        &self,
        subject_id: &str,
        mut extra_claims: Map<String, Value>,
        ttl: Duration,
    ) -> Result<String, AuthError> {
        for reserved in RESERVED_CLAIMS {
            extra_claims.remove(reserved);
        }

        let now = self.clock.now().timestamp();
        let claims = Claims {
            sub: subject_id.to_string(),
            iat: now,
            exp: now + ttl.num_seconds(),
            token_type: ACCESS_TOKEN_TYPE.to_string(),
            extra: extra_claims,
        };

        encode(&Header::new(self.algorithm), &claims, &self.encoding_key)
            .map_err(|e| AuthError::Internal(format!("Failed to sign access token: {}", e)))
    }

    /// 사용자용 Access Token 발급 (username 클레임 포함)
    /// Access token for a user with the configured lifetime
    pub fn generate_access_token(&self, user: &User) -> Result<String, AuthError> {
        let mut extra = Map::new();
        extra.insert("username".to_string(), Value::String(user.username.clone()));

        self.issue_access_token(&user.id.to_string(), extra, self.access_token_ttl)
    }

    /// Access Token 검증
    /// Verify signature, expiry (no leeway) and token type
    pub fn verify_access_token(&self, token: &str) -> Result<Claims, AuthError> {
        // exp는 주입된 시계로 직접 확인
        let mut validation = Validation::new(self.algorithm);
        validation.leeway = 0;
        validation.validate_exp = false;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let token_data =
            decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
                tracing::debug!(error = %e, "access token rejected");
                AuthError::InvalidToken
            })?;

        if self.clock.now().timestamp() > token_data.claims.exp {
            return Err(AuthError::AccessTokenExpired);
        }

        if token_data.claims.token_type != ACCESS_TOKEN_TYPE {
            tracing::warn!(token_type = %token_data.claims.token_type, "invalid token type");
            return Err(AuthError::WrongTokenType);
        }

        Ok(token_data.claims)
    }

    /// 불투명 토큰 생성 (Refresh Token, 재설정 토큰 등 공통)
    /// 256-bit random string, base64url without padding
    pub fn generate_opaque_credential() -> String {
        let mut bytes = [0u8; OPAQUE_CREDENTIAL_BYTES];
        OsRng.fill_bytes(&mut bytes);
        URL_SAFE_NO_PAD.encode(bytes)
    }

    /// Refresh Token 생성 (랜덤 문자열, 해시만 DB에 저장)
    /// Generate Refresh Token
    pub fn generate_refresh_token(&self) -> String {
        Self::generate_opaque_credential()
    }

    /// Refresh Token 해싱 (DB 저장용)
    /// Hash Refresh Token (for database storage)
    pub fn hash_refresh_token(&self, token: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(token.as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::utils::ManualClock;
    use serde_json::json;
    use std::collections::HashSet;

    fn service_with_clock() -> (JwtService, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::default());
        let jwt = JwtService::new(
            &JwtConfig {
                secret: "unit-test-secret".to_string(),
                algorithm: Algorithm::HS256,
                access_token_ttl_minutes: 30,
            },
            clock.clone(),
        );
        (jwt, clock)
    }

    fn service() -> JwtService {
        service_with_clock().0
    }

    fn extra(username: &str) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert("username".to_string(), json!(username));
        map
    }

    #[test]
    fn issued_token_verifies_with_claims() {
        let jwt = service();
        let token = jwt
            .issue_access_token("42", extra("alice"), Duration::minutes(5))
            .unwrap();

        let claims = jwt.verify_access_token(&token).unwrap();
        assert_eq!(claims.sub, "42");
        assert_eq!(claims.user_id().unwrap(), 42);
        assert_eq!(claims.username(), Some("alice"));
        assert_eq!(claims.token_type, "access");
        assert_eq!(claims.exp - claims.iat, 300);
    }

    #[test]
    fn expired_token_is_reported_as_expired() {
        let jwt = service();
        let token = jwt
            .issue_access_token("42", Map::new(), Duration::seconds(-5))
            .unwrap();

        assert!(matches!(
            jwt.verify_access_token(&token),
            Err(AuthError::AccessTokenExpired)
        ));
    }

    #[test]
    fn expiry_follows_the_injected_clock() {
        let (jwt, clock) = service_with_clock();
        let token = jwt
            .issue_access_token("42", Map::new(), Duration::seconds(60))
            .unwrap();

        clock.advance_secs(60);
        assert!(jwt.verify_access_token(&token).is_ok());

        clock.advance_secs(1);
        assert!(matches!(
            jwt.verify_access_token(&token),
            Err(AuthError::AccessTokenExpired)
        ));
    }

    #[test]
    fn tampered_or_foreign_tokens_are_invalid() {
        let jwt = service();
        let token = jwt
            .issue_access_token("42", Map::new(), Duration::minutes(5))
            .unwrap();

        let mut tampered = token.clone();
        tampered.push('x');
        assert!(matches!(
            jwt.verify_access_token(&tampered),
            Err(AuthError::InvalidToken)
        ));

        let other = JwtService::new(
            &JwtConfig {
                secret: "another-secret".to_string(),
                ..JwtConfig::default()
            },
            Arc::new(ManualClock::default()),
        );
        assert!(matches!(
            other.verify_access_token(&token),
            Err(AuthError::InvalidToken)
        ));

        assert!(matches!(
            jwt.verify_access_token("not-a-jwt"),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn non_access_token_type_is_rejected() {
        let (jwt, clock) = service_with_clock();
        let now = clock.now().timestamp();
        let claims = Claims {
            sub: "42".to_string(),
            iat: now,
            exp: now + 60,
            token_type: "refresh".to_string(),
            extra: Map::new(),
        };
        let token = encode(&Header::default(), &claims, &jwt.encoding_key).unwrap();

        assert!(matches!(
            jwt.verify_access_token(&token),
            Err(AuthError::WrongTokenType)
        ));
    }

    #[test]
    fn extra_claims_cannot_override_reserved_ones() {
        let jwt = service();
        let mut claims = extra("alice");
        claims.insert("sub".to_string(), json!("0"));
        claims.insert("type".to_string(), json!("refresh"));

        let token = jwt
            .issue_access_token("42", claims, Duration::minutes(5))
            .unwrap();
        let verified = jwt.verify_access_token(&token).unwrap();

        assert_eq!(verified.sub, "42");
        assert_eq!(verified.token_type, "access");
    }

    #[test]
    fn opaque_credentials_are_url_safe_and_unique() {
        let tokens: HashSet<String> = (0..100)
            .map(|_| JwtService::generate_opaque_credential())
            .collect();
        assert_eq!(tokens.len(), 100);

        for token in &tokens {
            assert_eq!(token.len(), 43);
            assert!(token
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
        }
    }

    #[test]
    fn refresh_token_hash_is_stable_hex_digest() {
        let jwt = service();
        let digest = jwt.hash_refresh_token("abc");

        assert_eq!(digest, jwt.hash_refresh_token("abc"));
        assert_eq!(digest.len(), 64);
        assert_ne!(digest, jwt.hash_refresh_token("abd"));
    }
}
