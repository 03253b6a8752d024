use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};

use roster_common::User;

use crate::auth::VerifiedToken;
use crate::error::ApiError;
use crate::AppState;

/// Verified identity claims plus the caller's database record,
/// attached to the request once it passes the gateway.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub token: VerifiedToken,
    pub user: User,
}

/// Middleware that verifies the bearer token and loads the caller's
/// user record. Unregistered or deactivated callers never reach a
/// handler.
pub async fn authenticate(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = match state.verifier.authenticate(request.headers()).await {
        Ok(token) => token,
        Err(e) => {
            tracing::debug!("Token verification failed: {}", e);
            return ApiError::from(e).into_response();
        }
    };

    let user = match state.store.find_by_subject(&token.subject) {
        Ok(Some(user)) => user,
        Ok(None) => {
            return ApiError::Forbidden("User not found in database".to_string()).into_response();
        }
        Err(e) => {
            tracing::error!("Failed to look up user {}: {}", token.subject, e);
            return ApiError::Internal("Internal server error".to_string()).into_response();
        }
    };

    if !user.is_active {
        return ApiError::Forbidden("Account is deactivated".to_string()).into_response();
    }

    request.extensions_mut().insert(AuthContext { token, user });
    next.run(request).await
}

/// Middleware that requires an admin user. Must be layered after
/// [`authenticate`].
pub async fn require_admin(request: Request, next: Next) -> Response {
    let Some(context) = request.extensions().get::<AuthContext>() else {
        tracing::error!("require_admin ran without an authenticated context");
        return ApiError::Internal("Internal server error".to_string()).into_response();
    };

    if !context.user.is_admin() {
        return ApiError::Forbidden("Forbidden: Admin access required".to_string())
            .into_response();
    }

    next.run(request).await
}
