use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use crate::shared::config::LogFormat;

/// 로깅 초기화
/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins over the configured level when it is set.
pub fn init(level: &str, format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_current_span(true))
            .init(),
        LogFormat::Console => registry.with(fmt::layer().with_target(false)).init(),
    }
}

/// 민감 정보 마스킹 (로그용)
/// Mask a sensitive value (email, token) for logging, keeping the first
/// `visible` characters.
pub fn mask_sensitive(data: &str, visible: usize) -> String {
    let total = data.chars().count();
    if total <= visible {
        return "*".repeat(total);
    }

    let head: String = data.chars().take(visible).collect();
    format!("{}{}", head, "*".repeat(total - visible))
}
