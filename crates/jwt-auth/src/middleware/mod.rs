//! HTTP middleware for protected routes.

pub mod auth;

pub use auth::{require_access, require_bearer, ClaimsExt};
