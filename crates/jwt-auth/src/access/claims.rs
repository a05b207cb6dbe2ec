use crate::access::AccessController;
use crate::auth::claims::{intersects, TokenClaims};
use crate::auth::session::{authorization_header, SessionAuthenticator};
use crate::errors::{messages, AuthError};
use crate::services::RoleResolver;
use async_trait::async_trait;
use axum::http::HeaderMap;
use std::fmt;
use std::sync::Arc;
use tracing::instrument;

/// Where a claims-mode decision reads the principal's roles from.
#[derive(Clone)]
pub enum RoleCheck {
    /// Soft check: trust the `roles` claim embedded in the token.
    Embedded,

    /// Hard check: ask the role service on every request.
    Remote(Arc<dyn RoleResolver>),
}

impl fmt::Debug for RoleCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoleCheck::Embedded => f.write_str("Embedded"),
            RoleCheck::Remote(_) => f.write_str("Remote"),
        }
    }
}

/// Non-strict access control over token claims.
///
/// Runs authentication up to and including the revocation check, without
/// resolving a user.
///
/// In [`RoleCheck::Embedded`] mode the decision uses the roles written into
/// the token at issuance. A role revoked after issuance stays effective until
/// the token expires. Use [`RoleCheck::Remote`] where that window matters.
pub struct ClaimsAccessController<U = ()> {
    authenticator: Arc<SessionAuthenticator<U>>,
    required_roles: Vec<String>,
    check: RoleCheck,
}

impl<U> ClaimsAccessController<U> {
    pub fn new<S: Into<String>>(
        authenticator: Arc<SessionAuthenticator<U>>,
        required_roles: impl IntoIterator<Item = S>,
        check: RoleCheck,
    ) -> Self {
        Self {
            authenticator,
            required_roles: required_roles.into_iter().map(Into::into).collect(),
            check,
        }
    }

    /// Controller deciding on the embedded `roles` claim.
    pub fn soft<S: Into<String>>(
        authenticator: Arc<SessionAuthenticator<U>>,
        required_roles: impl IntoIterator<Item = S>,
    ) -> Self {
        Self::new(authenticator, required_roles, RoleCheck::Embedded)
    }

    /// Controller deciding on roles fetched from `resolver`.
    pub fn hard<S: Into<String>>(
        authenticator: Arc<SessionAuthenticator<U>>,
        required_roles: impl IntoIterator<Item = S>,
        resolver: Arc<dyn RoleResolver>,
    ) -> Self {
        Self::new(authenticator, required_roles, RoleCheck::Remote(resolver))
    }

    pub fn required_roles(&self) -> &[String] {
        &self.required_roles
    }

    pub fn is_hard_check(&self) -> bool {
        matches!(self.check, RoleCheck::Remote(_))
    }

    async fn permits(&self, claims: &TokenClaims, headers: &HeaderMap) -> Result<bool, AuthError> {
        match &self.check {
            RoleCheck::Embedded => Ok(claims.has_any_role(&self.required_roles)),
            RoleCheck::Remote(resolver) => {
                let subject = claims
                    .subject()
                    .ok_or_else(|| AuthError::unauthorized(messages::SUB_NOT_DEFINED))?;
                // Authentication already succeeded, so the header is present.
                let authorization = authorization_header(headers)
                    .ok_or_else(|| AuthError::unauthorized(messages::INVALID_TOKEN_ACCESS))?;

                let roles = resolver.fetch_roles(subject, authorization).await?;
                Ok(intersects(
                    roles.iter().map(|role| role.name.as_str()),
                    &self.required_roles,
                ))
            }
        }
    }
}

#[async_trait]
impl<U> AccessController for ClaimsAccessController<U>
where
    U: Send + Sync + 'static,
{
    type Principal = TokenClaims;

    fn principal_claims(principal: &TokenClaims) -> &TokenClaims {
        principal
    }

    #[instrument(skip_all, name = "jwt_auth.access.claims", fields(hard_check = self.is_hard_check()))]
    async fn authorize(&self, headers: &HeaderMap) -> Result<TokenClaims, AuthError> {
        let claims = self.authenticator.authenticate_claims_from(headers).await?;

        if !self.permits(&claims, headers).await? {
            tracing::debug!(
                target: "jwt_auth.access",
                required = ?self.required_roles,
                hard_check = self.is_hard_check(),
                "Principal holds none of the required roles"
            );
            return Err(AuthError::no_privileges());
        }

        Ok(claims)
    }
}
