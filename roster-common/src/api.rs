//! JSON envelopes exchanged between the backend and its clients.
//!
//! Single-user responses wrap the record as `{"user": ...}`, list
//! responses as `{"users": [...]}`, and every failure body is
//! `{"error": "<message>"}`.

use serde::{Deserialize, Serialize};

use crate::user::{Role, User};

/// Response carrying a single user record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub user: User,
}

/// Response carrying the full user list, newest first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsersResponse {
    pub users: Vec<User>,
}

/// Response carrying a human-readable confirmation message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Error body returned with every non-2xx response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Body of PATCH /api/admin/users/:id/status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusUpdateRequest {
    pub is_active: bool,
}

/// Body of PATCH /api/admin/users/:id/role.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleUpdateRequest {
    pub role: Role,
}
