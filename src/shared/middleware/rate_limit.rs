use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::shared::errors::AuthError;
use crate::shared::middleware::client::client_ip;
use crate::shared::rate_limit::RateDecision;
use crate::shared::services::AppState;

/// 요청 제한 미들웨어
/// Global tiers first, then the route's own tiers. Denied requests never
/// reach the handler and get 429 with `Retry-After`.
pub async fn rate_limit(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let policy = &state.rate_limit_policy;
    let path = request.uri().path();

    if !policy.enabled || policy.is_exempt(path) {
        return next.run(request).await;
    }

    let identity = client_ip(request.extensions());

    let mut decision = state.rate_limiter.check_tiers(&identity, &policy.global);
    if decision.is_allowed() {
        if let Some(tiers) = policy.endpoint_tiers(request.method(), path) {
            decision = state.rate_limiter.check_tiers(&identity, tiers);
        }
    }

    if let RateDecision::Denied { retry_after } = decision {
        tracing::warn!(
            identity = %identity,
            method = %request.method(),
            path = %path,
            retry_after = retry_after,
            "rate limit exceeded"
        );
        return AuthError::RateLimitExceeded { retry_after }.into_response();
    }

    next.run(request).await
}
