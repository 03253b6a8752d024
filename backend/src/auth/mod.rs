pub mod gateway;
pub mod jwks;

pub use gateway::AuthContext;
pub use jwks::{AuthError, JwksVerifier, VerifiedToken};
