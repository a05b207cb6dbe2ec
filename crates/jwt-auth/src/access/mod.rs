//! Role-based access control.
//!
//! An access controller authenticates the request, then decides whether the
//! principal holds any of the required roles. Two controllers share the same
//! contract:
//!
//! - [`EntityAccessController`] - strict: roles come from the resolved user
//! - [`ClaimsAccessController`] - non-strict: roles come from the token
//!   claims, or from the remote role service in hard-check mode
//!
//! The required role set is matched by intersection. An empty required set
//! never permits.

mod claims;
mod entity;

pub use claims::{ClaimsAccessController, RoleCheck};
pub use entity::EntityAccessController;

use crate::auth::claims::TokenClaims;
use crate::errors::AuthError;
use async_trait::async_trait;
use axum::http::HeaderMap;
use std::future::Future;

/// Authenticate-then-authorize contract shared by both controllers.
#[async_trait]
pub trait AccessController: Send + Sync {
    /// What a permitted request resolves to.
    type Principal: Send;

    /// Authenticate the request in `headers` and decide permit/deny.
    ///
    /// # Errors
    ///
    /// - `Unauthorized` - authentication failed
    /// - `Forbidden("no privileges")` - authenticated but no required role held
    /// - `Upstream` - remote role lookup failed (hard-check mode)
    async fn authorize(&self, headers: &HeaderMap) -> Result<Self::Principal, AuthError>;

    /// The validated token claims behind a principal.
    fn principal_claims(principal: &Self::Principal) -> &TokenClaims;

    /// Wrap `operation` so it only runs for permitted requests.
    fn secure<F>(self, operation: F) -> Guarded<Self, F>
    where
        Self: Sized,
    {
        Guarded {
            controller: self,
            operation,
        }
    }
}

/// An operation guarded by an access controller.
pub struct Guarded<C, F> {
    controller: C,
    operation: F,
}

impl<C, F> Guarded<C, F>
where
    C: AccessController,
{
    /// Authorize the request, then run the operation with the principal.
    ///
    /// The operation never runs when authorization fails.
    pub async fn invoke<Fut, T>(&self, headers: &HeaderMap) -> Result<T, AuthError>
    where
        F: Fn(C::Principal) -> Fut,
        Fut: Future<Output = T>,
    {
        let principal = self.controller.authorize(headers).await?;
        Ok((self.operation)(principal).await)
    }

    pub fn controller(&self) -> &C {
        &self.controller
    }
}
