//! User lookup contract for the strict (entity) authentication flow.

use crate::errors::AuthError;
use async_trait::async_trait;

/// A resolved user that carries role labels.
pub trait UserEntity {
    /// Names of the roles attached to this user.
    fn role_names(&self) -> Vec<&str>;
}

/// Resolves a subject identifier to a user record.
///
/// Implemented by the embedding application over its own storage.
#[async_trait]
pub trait UserLookup<U>: Send + Sync {
    /// Find the user with the given row id. `Ok(None)` means not found.
    async fn find(&self, row_id: &str) -> Result<Option<U>, AuthError>;
}
