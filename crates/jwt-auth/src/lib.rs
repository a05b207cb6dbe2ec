//! Bearer-token authentication and role-based access control for HTTP
//! services.
//!
//! The crate issues and verifies HMAC-signed JWTs, checks them against a
//! revocation record supplied by the application, and gates handlers by role.
//!
//! # Request flow
//!
//! ```text
//! Authorization header -> SessionAuthenticator -> principal -> AccessController -> permit/deny
//! ```
//!
//! # Modules
//!
//! - `config` - Configuration from environment
//! - `errors` - Error types with HTTP status code mapping
//! - `clock` - Time source in the configured time zone
//! - `retry` - Jittered exponential backoff
//! - `auth` - Token codec and session authentication
//! - `access` - Strict and claims-based access controllers
//! - `services` - Remote role service client
//! - `middleware` - Axum middleware for protected routes

pub mod access;
pub mod auth;
pub mod clock;
pub mod config;
pub mod errors;
pub mod middleware;
pub mod retry;
pub mod services;

pub use access::{AccessController, ClaimsAccessController, EntityAccessController, RoleCheck};
pub use auth::{
    AuthenticatedUser, RevocationOracle, RevocationRecord, SessionAuthenticator, TokenClaims,
    TokenCodec, UserEntity, UserLookup,
};
pub use config::AuthConfig;
pub use errors::AuthError;
