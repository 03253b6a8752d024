//! Admin API routes.
//!
//! Provides:
//! - User listing and lookup (`/api/admin/users`, `/api/admin/users/:id`)
//! - Status and role updates (`/api/admin/users/:id/status`, `/:id/role`)
//! - User deletion with a self-delete guard (`DELETE /api/admin/users/:id`)
//!
//! Every route sits behind the auth gateway plus the admin check.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    middleware,
    routing::{get, patch},
    Extension, Json, Router,
};

use roster_common::{
    MessageResponse, RoleUpdateRequest, StatusUpdateRequest, UserResponse, UsersResponse,
};

use crate::auth::{gateway, AuthContext};
use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// GET /api/admin/users - List all users, newest first
async fn list_users(State(state): State<Arc<AppState>>) -> ApiResult<Json<UsersResponse>> {
    let users = state.store.list_all().map_err(|e| {
        tracing::error!("Failed to fetch users: {}", e);
        ApiError::Internal("Failed to fetch users".to_string())
    })?;
    Ok(Json(UsersResponse { users }))
}

/// GET /api/admin/users/:id - Fetch a single user
async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<Json<UserResponse>> {
    let user = state
        .store
        .find_by_id(id)
        .map_err(|e| {
            tracing::error!("Failed to fetch user {}: {}", id, e);
            ApiError::Internal("Failed to fetch user".to_string())
        })?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;
    Ok(Json(UserResponse { user }))
}

/// PATCH /api/admin/users/:id/status - Activate or deactivate a user.
///
/// `is_active` must be a genuine boolean, truthy strings and numbers
/// are rejected.
async fn set_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(body): Json<serde_json::Value>,
) -> ApiResult<Json<UserResponse>> {
    let request: StatusUpdateRequest = serde_json::from_value(body)
        .map_err(|_| ApiError::BadRequest("is_active must be a boolean".to_string()))?;
    let is_active = request.is_active;

    let user = state
        .store
        .set_active(id, is_active)
        .map_err(|e| {
            tracing::error!("Failed to update user status: {}", e);
            ApiError::Internal("Failed to update user status".to_string())
        })?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    tracing::info!("Updated user {} status to is_active={}", id, is_active);
    Ok(Json(UserResponse { user }))
}

/// PATCH /api/admin/users/:id/role - Change a user's role.
///
/// `role` must be exactly "user" or "admin".
async fn set_role(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(body): Json<serde_json::Value>,
) -> ApiResult<Json<UserResponse>> {
    let request: RoleUpdateRequest = serde_json::from_value(body)
        .map_err(|_| ApiError::BadRequest("Invalid role".to_string()))?;
    let role = request.role;

    let user = state
        .store
        .set_role(id, role)
        .map_err(|e| {
            tracing::error!("Failed to update user role: {}", e);
            ApiError::Internal("Failed to update user role".to_string())
        })?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    tracing::info!("Updated user {} role to {}", id, role);
    Ok(Json(UserResponse { user }))
}

/// DELETE /api/admin/users/:id - Remove a user.
///
/// Admins cannot delete the account behind their own token.
async fn delete_user(
    State(state): State<Arc<AppState>>,
    Extension(context): Extension<AuthContext>,
    Path(id): Path<i64>,
) -> ApiResult<Json<MessageResponse>> {
    let target = state
        .store
        .find_by_id(id)
        .map_err(|e| {
            tracing::error!("Failed to delete user {}: {}", id, e);
            ApiError::Internal("Failed to delete user".to_string())
        })?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    if target.subject == context.token.subject {
        return Err(ApiError::BadRequest(
            "Cannot delete your own account".to_string(),
        ));
    }

    let deleted = state.store.delete(id).map_err(|e| {
        tracing::error!("Failed to delete user {}: {}", id, e);
        ApiError::Internal("Failed to delete user".to_string())
    })?;
    if !deleted {
        return Err(ApiError::NotFound("User not found".to_string()));
    }

    tracing::info!("User {} deleted by {}", id, context.user.subject);
    Ok(Json(MessageResponse {
        message: "User deleted successfully".to_string(),
    }))
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/users", get(list_users))
        .route("/users/:id", get(get_user).delete(delete_user))
        .route("/users/:id/status", patch(set_status))
        .route("/users/:id/role", patch(set_role))
        .layer(middleware::from_fn(gateway::require_admin))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            gateway::authenticate,
        ))
        .with_state(state)
}
