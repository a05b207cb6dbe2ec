//! In-memory collaborators for authentication tests
//!
//! - [`InMemoryRevocationOracle`] - revocation records keyed by subject
//! - [`InMemoryUserStore`] - users keyed by id, carrying role names
//!
//! # Example
//!
//! ```rust,ignore
//! let oracle = InMemoryRevocationOracle::new().with_record(
//!     "alice",
//!     RevocationRecord { jti: "old".into(), disabled_at: TEST_NOW, disable_other: true },
//! );
//! let users = InMemoryUserStore::new().with_user(TestUser::new("alice", &["admin"]));
//! ```

use async_trait::async_trait;
use jwt_auth::auth::{RevocationOracle, RevocationRecord, UserEntity, UserLookup};
use jwt_auth::AuthError;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Revocation oracle backed by a map.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRevocationOracle {
    records: Arc<Mutex<HashMap<String, RevocationRecord>>>,
    lookups: Arc<AtomicUsize>,
    fail: bool,
}

impl InMemoryRevocationOracle {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Oracle whose lookups always fail.
    #[must_use]
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Add a record for `subject`.
    #[must_use]
    pub fn with_record(self, subject: impl ToString, record: RevocationRecord) -> Self {
        self.set_record(subject, record);
        self
    }

    /// Replace the record for `subject`.
    pub fn set_record(&self, subject: impl ToString, record: RevocationRecord) {
        self.records
            .lock()
            .expect("revocation map poisoned")
            .insert(subject.to_string(), record);
    }

    /// Number of lookups served.
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RevocationOracle for InMemoryRevocationOracle {
    async fn get_from_cache(
        &self,
        subject_id: &str,
    ) -> Result<Option<RevocationRecord>, AuthError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(AuthError::Internal("revocation cache unavailable".to_string()));
        }

        Ok(self
            .records
            .lock()
            .expect("revocation map poisoned")
            .get(subject_id)
            .cloned())
    }
}

/// A user with an id and role names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestUser {
    pub id: String,
    pub roles: Vec<String>,
}

impl TestUser {
    pub fn new(id: impl ToString, roles: &[&str]) -> Self {
        Self {
            id: id.to_string(),
            roles: roles.iter().map(ToString::to_string).collect(),
        }
    }
}

impl UserEntity for TestUser {
    fn role_names(&self) -> Vec<&str> {
        self.roles.iter().map(String::as_str).collect()
    }
}

/// User lookup backed by a map.
#[derive(Debug, Clone, Default)]
pub struct InMemoryUserStore {
    users: Arc<Mutex<HashMap<String, TestUser>>>,
}

impl InMemoryUserStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_user(self, user: TestUser) -> Self {
        self.users
            .lock()
            .expect("user map poisoned")
            .insert(user.id.clone(), user);
        self
    }
}

#[async_trait]
impl UserLookup<TestUser> for InMemoryUserStore {
    async fn find(&self, row_id: &str) -> Result<Option<TestUser>, AuthError> {
        Ok(self
            .users
            .lock()
            .expect("user map poisoned")
            .get(row_id)
            .cloned())
    }
}
