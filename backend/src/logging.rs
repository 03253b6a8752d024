use std::time::Instant;

use axum::{extract::Request, middleware::Next, response::Response};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::LoggingConfig;

/// Install the global tracing subscriber. `RUST_LOG` overrides the
/// configured level.
pub fn init(config: &LoggingConfig) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Middleware that logs HTTP requests at INFO level. Health probes are
/// demoted to DEBUG so uptime polling stays out of the main log stream.
pub async fn request_logger(request: Request, next: Next) -> Response {
    let started = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let response = next.run(request).await;

    let status = response.status().as_u16();
    let elapsed = started.elapsed();

    if path == "/health" {
        tracing::debug!(
            method = %method,
            path = %path,
            status = %status,
            duration_ms = %elapsed.as_millis(),
            "HTTP request"
        );
    } else {
        tracing::info!(
            method = %method,
            path = %path,
            status = %status,
            duration_ms = %elapsed.as_millis(),
            "HTTP request"
        );
    }

    response
}
