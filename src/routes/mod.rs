// Routes module: 라우팅 설정
// 역할: 모든 도메인의 라우터를 조합
// Routes module: combines all domain routers
pub mod health;

use axum::{
    http::{header, HeaderName, HeaderValue},
    middleware,
    routing::get,
    Router,
};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::domains::auth::routes::{create_admin_router, create_auth_router, create_user_router};
use crate::shared::config::Environment;
use crate::shared::middleware::rate_limit::rate_limit;
use crate::shared::services::AppState;

const PERMISSIONS_POLICY: &str = "geolocation=(), microphone=(), camera=(), payment=(), \
     usb=(), magnetometer=(), gyroscope=(), accelerometer=()";

const CONTENT_SECURITY_POLICY: &str = "default-src 'self'; \
     script-src 'self' 'unsafe-inline' 'unsafe-eval'; \
     style-src 'self' 'unsafe-inline'; \
     img-src 'self' data: https:; \
     font-src 'self' data:; \
     connect-src 'self'; \
     frame-ancestors 'none'; \
     base-uri 'self'; \
     form-action 'self'";

const STRICT_TRANSPORT_SECURITY: &str = "max-age=31536000; includeSubDomains; preload";

/// Create main router (combines all domain routers)
/// 메인 라우터 생성 (모든 도메인 라우터 조합 + 요청 제한 미들웨어)
pub fn create_router(state: AppState) -> Router<AppState> {
    let environment = state.config.environment;

    let router = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check))
        .nest("/api/auth", create_auth_router())
        .nest("/api/users", create_user_router())
        .nest("/api/admin", create_admin_router())
        .layer(middleware::from_fn_with_state(state, rate_limit))
        .layer(TraceLayer::new_for_http());

    with_security_headers(router, environment)
}

/// Router with state attached, ready to serve
pub fn create_app(state: AppState) -> Router {
    create_router(state.clone()).with_state(state)
}

// 보안 헤더 (429, 401 등 모든 응답에 적용)
// CSP, HSTS는 운영 환경에서만
fn with_security_headers(router: Router<AppState>, environment: Environment) -> Router<AppState> {
    let router = router
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_XSS_PROTECTION,
            HeaderValue::from_static("1; mode=block"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::REFERRER_POLICY,
            HeaderValue::from_static("strict-origin-when-cross-origin"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            HeaderName::from_static("permissions-policy"),
            HeaderValue::from_static(PERMISSIONS_POLICY),
        ));

    if environment != Environment::Production {
        return router;
    }

    router
        .layer(SetResponseHeaderLayer::if_not_present(
            header::CONTENT_SECURITY_POLICY,
            HeaderValue::from_static(CONTENT_SECURITY_POLICY),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::STRICT_TRANSPORT_SECURITY,
            HeaderValue::from_static(STRICT_TRANSPORT_SECURITY),
        ))
}
