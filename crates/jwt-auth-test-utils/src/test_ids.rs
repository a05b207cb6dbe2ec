//! Fixed test IDs and keys for deterministic tests
//!
//! All values are constant so token contents are reproducible.

use uuid::Uuid;

// Subjects (100-199)
pub const TEST_USER_ALICE: Uuid = Uuid::from_u128(100);
pub const TEST_USER_BOB: Uuid = Uuid::from_u128(101);
pub const TEST_USER_UNKNOWN: Uuid = Uuid::from_u128(199);

// Signing secrets
pub const TEST_ACCESS_KEY: &str = "test-access-secret-do-not-use-in-production";
pub const TEST_REFRESH_KEY: &str = "test-refresh-secret-do-not-use-in-production";
pub const TEST_OTHER_KEY: &str = "some-unrelated-secret";

/// Reference instant for fixed clocks (2023-11-14T22:13:20Z).
pub const TEST_NOW: i64 = 1_700_000_000;

// Roles
pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_EDITOR: &str = "editor";
pub const ROLE_VIEWER: &str = "viewer";
