//! # jwt-auth Test Utilities
//!
//! Shared test utilities for the `jwt-auth` crate.
//!
//! This crate provides:
//! - Fixed test IDs, keys and a reference instant
//! - Configuration and codec fixtures with frozen clocks
//! - Test token builder (TestTokenBuilder)
//! - In-memory revocation oracle and user store
//! - Custom assertions (AuthResultAssertions trait)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use jwt_auth_test_utils::*;
//!
//! #[tokio::test]
//! async fn test_example() {
//!     let authenticator = SessionAuthenticator::from_codec(
//!         test_codec(),
//!         Arc::new(InMemoryRevocationOracle::new()),
//!     );
//!
//!     let header = TestTokenBuilder::new().with_roles(&["admin"]).bearer();
//!
//!     authenticator.authenticate_claims(Some(&header)).await.assert_ok();
//! }
//! ```

pub mod assertions;
pub mod fixtures;
pub mod mocks;
pub mod test_ids;
pub mod token_builders;

// Re-export commonly used items
pub use assertions::*;
pub use fixtures::*;
pub use mocks::*;
pub use test_ids::*;
pub use token_builders::*;
