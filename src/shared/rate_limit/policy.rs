use axum::http::Method;

use crate::shared::config::RateLimitSettings;
use crate::shared::rate_limit::limiter::RateLimitTier;

/// Tiers applied to one route in addition to the global ones
#[derive(Debug, Clone)]
pub struct EndpointLimit {
    pub method: Method,
    pub path: String,
    pub tiers: Vec<RateLimitTier>,
}

/// 요청 제한 정책
/// Which tiers apply to which request.
///
/// Every non-exempt request is checked against `global`; routes listed in
/// `endpoints` are then checked against their own, stricter tiers.
#[derive(Debug, Clone)]
pub struct RateLimitPolicy {
    pub enabled: bool,
    pub global: Vec<RateLimitTier>,
    pub endpoints: Vec<EndpointLimit>,
    pub exempt_paths: Vec<String>,
}

impl RateLimitPolicy {
    /// 설정값 + 인증 엔드포인트 기본 티어
    pub fn from_settings(settings: &RateLimitSettings) -> Self {
        Self {
            enabled: settings.enabled,
            global: vec![
                RateLimitTier::per_minute(settings.per_minute),
                RateLimitTier::per_hour(settings.per_hour),
                RateLimitTier::per_day(settings.per_day),
            ],
            endpoints: default_endpoint_limits(),
            exempt_paths: vec!["/health".to_string()],
        }
    }

    pub fn disabled() -> Self {
        Self {
            enabled: false,
            global: Vec::new(),
            endpoints: Vec::new(),
            exempt_paths: Vec::new(),
        }
    }

    pub fn is_exempt(&self, path: &str) -> bool {
        self.exempt_paths
            .iter()
            .any(|exempt| path == exempt || path.starts_with(&format!("{}/", exempt)))
    }

    pub fn endpoint_tiers(&self, method: &Method, path: &str) -> Option<&[RateLimitTier]> {
        self.endpoints
            .iter()
            .find(|limit| limit.method == *method && limit.path == path)
            .map(|limit| limit.tiers.as_slice())
    }
}

impl Default for RateLimitPolicy {
    fn default() -> Self {
        Self::from_settings(&RateLimitSettings::default())
    }
}

fn endpoint(method: Method, path: &str, scope: &str, tiers: Vec<RateLimitTier>) -> EndpointLimit {
    EndpointLimit {
        method,
        path: path.to_string(),
        tiers: tiers.into_iter().map(|tier| tier.scoped(scope)).collect(),
    }
}

// 엔드포인트별 기본 한도
fn default_endpoint_limits() -> Vec<EndpointLimit> {
    vec![
        endpoint(
            Method::POST,
            "/api/auth/register",
            "register",
            vec![
                RateLimitTier::per_minute(5),
                RateLimitTier::per_hour(20),
                RateLimitTier::per_day(50),
            ],
        ),
        endpoint(
            Method::POST,
            "/api/auth/login",
            "login",
            vec![
                RateLimitTier::per_minute(10),
                RateLimitTier::per_hour(50),
                RateLimitTier::per_day(200),
            ],
        ),
        endpoint(
            Method::POST,
            "/api/auth/refresh",
            "refresh",
            vec![
                RateLimitTier::per_minute(5),
                RateLimitTier::per_hour(20),
                RateLimitTier::per_day(100),
            ],
        ),
        endpoint(
            Method::POST,
            "/api/auth/logout",
            "logout",
            vec![RateLimitTier::per_minute(20), RateLimitTier::per_hour(100)],
        ),
        endpoint(
            Method::GET,
            "/api/auth/me",
            "me",
            vec![RateLimitTier::per_minute(60), RateLimitTier::per_hour(500)],
        ),
        endpoint(
            Method::GET,
            "/api/users/me",
            "profile_get",
            vec![RateLimitTier::per_minute(100), RateLimitTier::per_hour(1000)],
        ),
        endpoint(
            Method::PUT,
            "/api/users/me",
            "profile_update",
            vec![RateLimitTier::per_minute(10), RateLimitTier::per_hour(50)],
        ),
        endpoint(
            Method::DELETE,
            "/api/users/me",
            "account_delete",
            vec![RateLimitTier::per_minute(5), RateLimitTier::per_hour(10)],
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_has_scoped_tiers() {
        let policy = RateLimitPolicy::default();
        let tiers = policy
            .endpoint_tiers(&Method::POST, "/api/auth/login")
            .unwrap();

        let names: Vec<&str> = tiers.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["login:minute", "login:hour", "login:day"]);
        assert_eq!(tiers[0].max_requests, 10);
    }

    #[test]
    fn method_distinguishes_profile_routes() {
        let policy = RateLimitPolicy::default();

        let update = policy.endpoint_tiers(&Method::PUT, "/api/users/me").unwrap();
        let delete = policy
            .endpoint_tiers(&Method::DELETE, "/api/users/me")
            .unwrap();
        let get = policy.endpoint_tiers(&Method::GET, "/api/users/me").unwrap();
        assert_eq!(update[0].max_requests, 10);
        assert_eq!(delete[0].max_requests, 5);
        assert_eq!(get[0].name, "profile_get:minute");
        assert_eq!(get[0].max_requests, 100);
        assert_eq!(get[1].max_requests, 1000);
        assert!(policy.endpoint_tiers(&Method::PATCH, "/api/users/me").is_none());
    }

    #[test]
    fn health_is_exempt() {
        let policy = RateLimitPolicy::default();

        assert!(policy.is_exempt("/health"));
        assert!(policy.is_exempt("/health/db"));
        assert!(!policy.is_exempt("/healthz"));
        assert!(!policy.is_exempt("/api/auth/login"));
    }

    #[test]
    fn global_tiers_follow_settings() {
        let settings = RateLimitSettings {
            enabled: true,
            per_minute: 1,
            per_hour: 2,
            per_day: 3,
        };
        let policy = RateLimitPolicy::from_settings(&settings);

        let limits: Vec<u32> = policy.global.iter().map(|t| t.max_requests).collect();
        assert_eq!(limits, vec![1, 2, 3]);
    }
}
