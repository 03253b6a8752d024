//! Roster Common Types
//!
//! Shared types used by both the backend and the admin console.

pub mod api;
pub mod user;

pub use api::{
    ErrorResponse, MessageResponse, RoleUpdateRequest, StatusUpdateRequest, UserResponse,
    UsersResponse,
};
pub use user::{Role, User};
