use std::net::SocketAddr;

use anyhow::{Context, Result};
use axum::http::{header, HeaderValue, Method};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use auth_server::domains::auth::models::*;
use auth_server::routes::create_router;
use auth_server::shared::config::AppConfig;
use auth_server::shared::services::AppState;
use auth_server::shared::utils::logging;

// OpenAPI 스키마 정의: Swagger 문서 자동 생성
#[derive(OpenApi)]
#[openapi(
    paths(
        auth_server::routes::health::health_check,
        auth_server::routes::health::readiness_check,
        auth_server::domains::auth::handlers::auth_handler::register,
        auth_server::domains::auth::handlers::auth_handler::login,
        auth_server::domains::auth::handlers::auth_handler::refresh,
        auth_server::domains::auth::handlers::auth_handler::logout,
        auth_server::domains::auth::handlers::auth_handler::logout_all,
        auth_server::domains::auth::handlers::auth_handler::get_me,
        auth_server::domains::auth::handlers::user_handler::get_profile,
        auth_server::domains::auth::handlers::user_handler::update_me,
        auth_server::domains::auth::handlers::user_handler::delete_me,
        auth_server::domains::auth::handlers::admin_handler::reset_rate_limit
    ),
    components(schemas(
        RegisterRequest,
        LoginRequest,
        RefreshTokenRequest,
        LogoutRequest,
        UpdateUserRequest,
        TokenResponse,
        MessageResponse,
        LogoutAllResponse,
        UserResponse
    )),
    modifiers(
        &SecurityAddon
    ),
    tags(
        (name = "Auth", description = "Registration, login, token refresh and logout"),
        (name = "Users", description = "Profile management"),
        (name = "Admin", description = "Administrative overrides"),
        (name = "Health", description = "Liveness")
    ),
    info(
        title = "Auth Server",
        description = "Token lifecycle management with sliding-window rate limiting",
        version = "1.0.0"
    )
)]
struct ApiDoc;

// Security scheme 정의: Swagger UI에서 "Authorize" 버튼 추가
struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "BearerAuth",
                utoipa::openapi::security::SecurityScheme::Http(
                    utoipa::openapi::security::HttpBuilder::new()
                        .scheme(utoipa::openapi::security::HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            )
        }
    }
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
        .allow_credentials(true)
}

#[tokio::main]
async fn main() -> Result<()> {
    // 설정 로드
    let config = AppConfig::from_env().context("Failed to load configuration")?;

    logging::init(&config.log_level, config.log_format);
    tracing::info!(environment = ?config.environment, "starting auth server");

    let bind_address = config.bind_address.clone();
    let cors = cors_layer(&config);

    // AppState 생성 (저장소 선택 + 모든 Service 초기화)
    let app_state = AppState::from_config(config)
        .await
        .context("Failed to initialize AppState")?;

    // Router 생성
    let app = Router::new()
        .merge(create_router(app_state.clone()))
        .merge(SwaggerUi::new("/api").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(cors)
        .with_state(app_state);

    let listener = TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", bind_address))?;

    tracing::info!(address = %bind_address, "server listening");
    tracing::info!("Swagger UI available at http://{}/api", bind_address);

    // 클라이언트 IP를 요청 제한 식별값으로 사용하기 위해 ConnectInfo 포함
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .context("Server error")?;

    Ok(())
}
