// API-facing error types
pub mod auth;

pub use auth::{AuthError, AuthErrorResponse};
