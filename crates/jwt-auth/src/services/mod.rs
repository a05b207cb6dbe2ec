//! Clients for external services consulted during access decisions.
//!
//! - `role_client` - HTTP client for the remote role service (hard checks)

pub mod role_client;

pub use role_client::{HttpRoleResolver, RoleRecord, RoleResolver};
