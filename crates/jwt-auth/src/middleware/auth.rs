//! Authentication and authorization middleware for protected routes.
//!
//! - [`require_bearer`] runs the claims flow and stores [`TokenClaims`] in
//!   request extensions.
//! - [`require_access`] runs any [`AccessController`] and stores its
//!   principal and the validated [`TokenClaims`] in request extensions.
//!
//! Failures short-circuit with the [`AuthError`] response; the inner
//! handler is never called.
//!
//! ```rust,ignore
//! let admin = Arc::new(ClaimsAccessController::soft(authenticator, ["admin"]));
//! let app = Router::new()
//!     .route("/admin", get(handler))
//!     .layer(from_fn_with_state(admin, require_access::<ClaimsAccessController>));
//! ```

use crate::access::AccessController;
use crate::auth::claims::TokenClaims;
use crate::auth::session::SessionAuthenticator;
use crate::errors::AuthError;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::instrument;

/// Authentication-only middleware.
///
/// # Response
///
/// - 401 with `WWW-Authenticate` if the token is missing, invalid, expired
///   or revoked
/// - otherwise continues with the claims in extensions
#[instrument(skip_all, name = "jwt_auth.middleware.bearer")]
pub async fn require_bearer<U>(
    State(authenticator): State<Arc<SessionAuthenticator<U>>>,
    req: Request,
    next: Next,
) -> Result<Response, AuthError>
where
    U: Send + Sync + 'static,
{
    let (mut parts, body) = req.into_parts();

    let claims = authenticator
        .authenticate_claims_from(&parts.headers)
        .await
        .inspect_err(|e| {
            tracing::debug!(target: "jwt_auth.middleware", error = %e, "Request rejected");
        })?;

    parts.extensions.insert(claims);

    Ok(next.run(Request::from_parts(parts, body)).await)
}

/// Role-gated middleware backed by an access controller.
///
/// # Response
///
/// - 401 if authentication fails
/// - 403 if the principal holds none of the required roles
/// - 502 if the remote role service could not be reached
/// - otherwise continues with the principal and its claims in extensions
#[instrument(skip_all, name = "jwt_auth.middleware.access")]
pub async fn require_access<C>(
    State(controller): State<Arc<C>>,
    req: Request,
    next: Next,
) -> Result<Response, AuthError>
where
    C: AccessController + 'static,
    C::Principal: Clone + Send + Sync + 'static,
{
    let (mut parts, body) = req.into_parts();

    let principal = controller
        .authorize(&parts.headers)
        .await
        .inspect_err(|e| {
            tracing::debug!(target: "jwt_auth.middleware", error = %e, "Request rejected");
        })?;

    parts
        .extensions
        .insert(C::principal_claims(&principal).clone());
    parts.extensions.insert(principal);

    Ok(next.run(Request::from_parts(parts, body)).await)
}

/// Extension trait for reading authenticated claims from a request.
pub trait ClaimsExt {
    /// Get the claims stored by the middleware.
    ///
    /// Returns `None` if no claims middleware ran for this request.
    fn claims(&self) -> Option<&TokenClaims>;
}

impl<B> ClaimsExt for axum::extract::Request<B> {
    fn claims(&self) -> Option<&TokenClaims> {
        self.extensions().get::<TokenClaims>()
    }
}
