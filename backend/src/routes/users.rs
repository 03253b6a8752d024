use std::sync::Arc;

use axum::{middleware, routing::get, Extension, Json, Router};

use roster_common::UserResponse;

use crate::auth::{gateway, AuthContext};
use crate::AppState;

/// GET /api/users/me - The authenticated caller's own record
async fn me(Extension(context): Extension<AuthContext>) -> Json<UserResponse> {
    Json(UserResponse { user: context.user })
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/me", get(me))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            gateway::authenticate,
        ))
        .with_state(state)
}
