pub mod auth;
pub mod config;
pub mod error;
pub mod logging;
pub mod routes;
pub mod store;
pub mod test_util;

pub use auth::{AuthContext, AuthError, JwksVerifier, VerifiedToken};
pub use config::Config;
pub use error::{ApiError, ApiResult};
pub use store::{StoreError, UserStore};

use std::sync::Arc;

use axum::http::HeaderValue;
use axum::{middleware, Router};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::CorsConfig;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub verifier: JwksVerifier,
    pub store: UserStore,
}

/// Assemble the full application router.
pub fn app(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.config.cors);

    Router::new()
        .merge(routes::health::router())
        .nest("/api/auth", routes::public::router(state.clone()))
        .nest("/api/users", routes::users::router(state.clone()))
        .nest("/api/admin", routes::admin::router(state))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(logging::request_logger))
}

fn cors_layer(config: &CorsConfig) -> CorsLayer {
    if config.origins.trim() == "*" {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<HeaderValue> = config
            .origins
            .split(',')
            .filter_map(|origin| origin.trim().parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    }
}
