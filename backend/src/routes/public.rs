//! Public auth routes.
//!
//! Callers present a bearer token from the identity provider; these
//! endpoints map the token to a local user record. Registration is
//! open to any verified identity, everything else requires an
//! existing record.

use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};

use roster_common::{Role, UserResponse};

use crate::error::{ApiError, ApiResult};
use crate::store::StoreError;
use crate::AppState;

/// POST /api/auth/register - Create a local record for a verified identity
async fn register(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> ApiResult<(StatusCode, Json<UserResponse>)> {
    let token = state.verifier.authenticate(&headers).await?;

    let existing = state.store.find_by_subject(&token.subject).map_err(|e| {
        tracing::error!("Failed to register user: {}", e);
        ApiError::Internal("Failed to register user".to_string())
    })?;
    if existing.is_some() {
        return Err(ApiError::Conflict("User already exists".to_string()));
    }

    let user = state
        .store
        .insert(
            &token.subject,
            token.email.as_deref(),
            token.display_name.as_deref(),
            Role::User,
        )
        .map_err(|e| match e {
            // Insert race on the subject surfaces the same way as the pre-check
            StoreError::Conflict => ApiError::Conflict("User already exists".to_string()),
            e => {
                tracing::error!("Failed to register user: {}", e);
                ApiError::Internal("Failed to register user".to_string())
            }
        })?;

    Ok((StatusCode::CREATED, Json(UserResponse { user })))
}

/// POST /api/auth/login - Stamp last_login and return the caller's record
async fn login(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> ApiResult<Json<UserResponse>> {
    let token = state.verifier.authenticate(&headers).await?;

    // last_login is stamped before the active check; a deactivated
    // account still records the attempt
    let user = state.store.touch_last_login(&token.subject).map_err(|e| {
        tracing::error!("Failed to log in: {}", e);
        ApiError::Internal("Failed to log in".to_string())
    })?;

    let user = user.ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    if !user.is_active {
        return Err(ApiError::Forbidden("Account is deactivated".to_string()));
    }

    Ok(Json(UserResponse { user }))
}

/// GET /api/auth/profile - Return the caller's record without touching last_login
async fn profile(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> ApiResult<Json<UserResponse>> {
    let token = state.verifier.authenticate(&headers).await?;

    let user = state.store.find_by_subject(&token.subject).map_err(|e| {
        tracing::error!("Failed to fetch user profile: {}", e);
        ApiError::Internal("Failed to fetch user profile".to_string())
    })?;

    let user = user.ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    if !user.is_active {
        return Err(ApiError::Forbidden("Account is deactivated".to_string()));
    }

    Ok(Json(UserResponse { user }))
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/profile", get(profile))
        .with_state(state)
}
