use std::fmt::Display;
use std::str::FromStr;

use jsonwebtoken::Algorithm;
use thiserror::Error;

const DEV_JWT_SECRET: &str = "insecure-dev-secret-change-in-production";

/// 설정 로딩 에러
/// Configuration errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {var}: {value:?} ({reason})")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Staging => "staging",
            Environment::Production => "production",
        }
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "staging" => Ok(Environment::Staging),
            "production" | "prod" => Ok(Environment::Production),
            other => Err(format!("unknown environment '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Console,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "console" => Ok(LogFormat::Console),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("expected 'console' or 'json', got '{}'", other)),
        }
    }
}

/// 세션 수 초과 시 정책
/// What happens when a user already holds `max_sessions` active refresh
/// credentials and authenticates again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionLimitPolicy {
    /// 가장 오래된 세션을 무효화 (기본값)
    /// Revoke the oldest session (FIFO by creation time)
    #[default]
    EvictOldest,
    /// 새 로그인을 거부
    /// Refuse the new session
    RejectNew,
}

impl FromStr for SessionLimitPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "evict_oldest" => Ok(SessionLimitPolicy::EvictOldest),
            "reject_new" => Ok(SessionLimitPolicy::RejectNew),
            other => Err(format!("expected 'evict_oldest' or 'reject_new', got '{}'", other)),
        }
    }
}

/// JWT 설정
/// Access token signing settings
#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub algorithm: Algorithm,
    pub access_token_ttl_minutes: i64,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: DEV_JWT_SECRET.to_string(),
            algorithm: Algorithm::HS256,
            access_token_ttl_minutes: 30,
        }
    }
}

/// 세션(Refresh Token) 설정
/// Refresh credential lifetime and session-limit policy
#[derive(Debug, Clone, Copy)]
pub struct SessionConfig {
    pub refresh_token_ttl_days: i64,
    /// 0 means unlimited
    pub max_sessions: usize,
    pub limit_policy: SessionLimitPolicy,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            refresh_token_ttl_days: 7,
            max_sessions: 5,
            limit_policy: SessionLimitPolicy::EvictOldest,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PasswordPolicy {
    pub min_length: usize,
    pub require_uppercase: bool,
    pub require_lowercase: bool,
    pub require_digits: bool,
    pub require_special: bool,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            min_length: 8,
            require_uppercase: true,
            require_lowercase: true,
            require_digits: true,
            require_special: false,
        }
    }
}

/// 요청 한도 설정 (전역 티어)
/// Global rate-limit tiers
#[derive(Debug, Clone, Copy)]
pub struct RateLimitSettings {
    pub enabled: bool,
    pub per_minute: u32,
    pub per_hour: u32,
    pub per_day: u32,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            per_minute: 60,
            per_hour: 1000,
            per_day: 10000,
        }
    }
}

/// 애플리케이션 설정
/// Application configuration, read from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: Environment,
    pub bind_address: String,
    /// Postgres URL; the in-memory store is used when absent
    pub database_url: Option<String>,
    pub jwt: JwtConfig,
    pub session: SessionConfig,
    pub password_policy: PasswordPolicy,
    pub rate_limit: RateLimitSettings,
    pub cors_origins: Vec<String>,
    pub log_level: String,
    pub log_format: LogFormat,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            environment: Environment::Development,
            bind_address: "0.0.0.0:3002".to_string(),
            database_url: None,
            jwt: JwtConfig::default(),
            session: SessionConfig::default(),
            password_policy: PasswordPolicy::default(),
            rate_limit: RateLimitSettings::default(),
            cors_origins: vec!["http://localhost:3000".to_string()],
            log_level: "info".to_string(),
            log_format: LogFormat::Console,
        }
    }
}

impl AppConfig {
    /// 환경 변수에서 설정 읽기
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 임의의 조회 함수로 설정 읽기 (테스트용)
    /// Load configuration through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = AppConfig::default();
        let environment: Environment = parse_or(&lookup, "APP_ENV", defaults.environment)?;

        let secret = match lookup("JWT_SECRET").filter(|s| !s.trim().is_empty()) {
            Some(secret) => secret,
            None if environment == Environment::Production => {
                return Err(ConfigError::Missing("JWT_SECRET"));
            }
            None => {
                tracing::warn!("JWT_SECRET not set, using the insecure development secret");
                DEV_JWT_SECRET.to_string()
            }
        };

        let algorithm = match lookup("JWT_ALGORITHM") {
            Some(raw) => parse_algorithm(&raw)?,
            None => defaults.jwt.algorithm,
        };

        let jwt = JwtConfig {
            secret,
            algorithm,
            access_token_ttl_minutes: parse_positive(
                &lookup,
                "ACCESS_TOKEN_EXPIRE_MINUTES",
                defaults.jwt.access_token_ttl_minutes,
            )?,
        };

        let session = SessionConfig {
            refresh_token_ttl_days: parse_positive(
                &lookup,
                "REFRESH_TOKEN_EXPIRE_DAYS",
                defaults.session.refresh_token_ttl_days,
            )?,
            max_sessions: parse_or(&lookup, "MAX_SESSIONS_PER_USER", defaults.session.max_sessions)?,
            limit_policy: parse_or(&lookup, "SESSION_LIMIT_POLICY", defaults.session.limit_policy)?,
        };

        let password_policy = PasswordPolicy {
            min_length: parse_or(&lookup, "PASSWORD_MIN_LENGTH", defaults.password_policy.min_length)?,
            require_uppercase: parse_bool(
                &lookup,
                "PASSWORD_REQUIRE_UPPERCASE",
                defaults.password_policy.require_uppercase,
            )?,
            require_lowercase: parse_bool(
                &lookup,
                "PASSWORD_REQUIRE_LOWERCASE",
                defaults.password_policy.require_lowercase,
            )?,
            require_digits: parse_bool(
                &lookup,
                "PASSWORD_REQUIRE_DIGITS",
                defaults.password_policy.require_digits,
            )?,
            require_special: parse_bool(
                &lookup,
                "PASSWORD_REQUIRE_SPECIAL",
                defaults.password_policy.require_special,
            )?,
        };

        let rate_limit = RateLimitSettings {
            enabled: parse_bool(&lookup, "RATE_LIMIT_ENABLED", defaults.rate_limit.enabled)?,
            per_minute: parse_or(&lookup, "RATE_LIMIT_PER_MINUTE", defaults.rate_limit.per_minute)?,
            per_hour: parse_or(&lookup, "RATE_LIMIT_PER_HOUR", defaults.rate_limit.per_hour)?,
            per_day: parse_or(&lookup, "RATE_LIMIT_PER_DAY", defaults.rate_limit.per_day)?,
        };

        let cors_origins = match lookup("CORS_ORIGINS") {
            Some(raw) => raw
                .split(',')
                .map(str::trim)
                .filter(|origin| !origin.is_empty())
                .map(str::to_string)
                .collect(),
            None => defaults.cors_origins,
        };

        Ok(Self {
            environment,
            bind_address: lookup("BIND_ADDRESS").unwrap_or(defaults.bind_address),
            database_url: lookup("DATABASE_URL").filter(|url| !url.trim().is_empty()),
            jwt,
            session,
            password_policy,
            rate_limit,
            cors_origins,
            log_level: lookup("LOG_LEVEL").unwrap_or(defaults.log_level),
            log_format: parse_or(&lookup, "LOG_FORMAT", defaults.log_format)?,
        })
    }
}

fn parse_or<T, F>(lookup: &F, var: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(var) {
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            var,
            value: raw.clone(),
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}

fn parse_positive<F>(lookup: &F, var: &'static str, default: i64) -> Result<i64, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let value = parse_or(lookup, var, default)?;
    if value <= 0 {
        return Err(ConfigError::Invalid {
            var,
            value: value.to_string(),
            reason: "must be greater than zero".to_string(),
        });
    }
    Ok(value)
}

fn parse_bool<F>(lookup: &F, var: &'static str, default: bool) -> Result<bool, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(var) else {
        return Ok(default);
    };

    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            var,
            value: raw,
            reason: "expected a boolean".to_string(),
        }),
    }
}

fn parse_algorithm(raw: &str) -> Result<Algorithm, ConfigError> {
    // Only HMAC algorithms: the signing key is a shared secret.
    match raw.trim().to_ascii_uppercase().as_str() {
        "HS256" => Ok(Algorithm::HS256),
        "HS384" => Ok(Algorithm::HS384),
        "HS512" => Ok(Algorithm::HS512),
        _ => Err(ConfigError::Invalid {
            var: "JWT_ALGORITHM",
            value: raw.to_string(),
            reason: "supported: HS256, HS384, HS512".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_environment_yields_defaults() {
        let config = AppConfig::from_lookup(lookup_from(&[])).unwrap();

        assert_eq!(config.environment, Environment::Development);
        assert_eq!(config.jwt.access_token_ttl_minutes, 30);
        assert_eq!(config.session.refresh_token_ttl_days, 7);
        assert_eq!(config.session.max_sessions, 5);
        assert_eq!(config.session.limit_policy, SessionLimitPolicy::EvictOldest);
        assert_eq!(config.rate_limit.per_minute, 60);
        assert!(config.database_url.is_none());
    }

    #[test]
    fn production_requires_a_secret() {
        let err = AppConfig::from_lookup(lookup_from(&[("APP_ENV", "production")])).unwrap_err();
        assert_eq!(err, ConfigError::Missing("JWT_SECRET"));
    }

    #[test]
    fn overrides_are_parsed() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("JWT_SECRET", "s3cret"),
            ("JWT_ALGORITHM", "hs512"),
            ("MAX_SESSIONS_PER_USER", "2"),
            ("SESSION_LIMIT_POLICY", "reject_new"),
            ("RATE_LIMIT_ENABLED", "false"),
            ("CORS_ORIGINS", "http://a.test, http://b.test"),
            ("LOG_FORMAT", "json"),
        ]))
        .unwrap();

        assert_eq!(config.jwt.secret, "s3cret");
        assert_eq!(config.jwt.algorithm, Algorithm::HS512);
        assert_eq!(config.session.max_sessions, 2);
        assert_eq!(config.session.limit_policy, SessionLimitPolicy::RejectNew);
        assert!(!config.rate_limit.enabled);
        assert_eq!(config.cors_origins, vec!["http://a.test", "http://b.test"]);
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn rejects_asymmetric_algorithms_and_bad_numbers() {
        assert!(AppConfig::from_lookup(lookup_from(&[("JWT_ALGORITHM", "RS256")])).is_err());
        assert!(AppConfig::from_lookup(lookup_from(&[("ACCESS_TOKEN_EXPIRE_MINUTES", "0")])).is_err());
        assert!(AppConfig::from_lookup(lookup_from(&[("RATE_LIMIT_PER_DAY", "lots")])).is_err());
    }
}
