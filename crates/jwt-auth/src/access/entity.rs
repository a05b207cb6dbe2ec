use crate::access::AccessController;
use crate::auth::claims::{intersects, TokenClaims};
use crate::auth::session::{AuthenticatedUser, SessionAuthenticator};
use crate::auth::users::UserEntity;
use crate::errors::AuthError;
use async_trait::async_trait;
use axum::http::HeaderMap;
use std::sync::Arc;
use tracing::instrument;

/// Strict access control over resolved users.
///
/// Runs the full authentication sequence including user lookup, then
/// permits if the user's role names intersect the required roles.
pub struct EntityAccessController<U> {
    authenticator: Arc<SessionAuthenticator<U>>,
    required_roles: Vec<String>,
}

impl<U> EntityAccessController<U> {
    pub fn new<S: Into<String>>(
        authenticator: Arc<SessionAuthenticator<U>>,
        required_roles: impl IntoIterator<Item = S>,
    ) -> Self {
        Self {
            authenticator,
            required_roles: required_roles.into_iter().map(Into::into).collect(),
        }
    }

    pub fn required_roles(&self) -> &[String] {
        &self.required_roles
    }
}

#[async_trait]
impl<U> AccessController for EntityAccessController<U>
where
    U: UserEntity + Send + Sync + 'static,
{
    type Principal = AuthenticatedUser<U>;

    fn principal_claims(principal: &AuthenticatedUser<U>) -> &TokenClaims {
        &principal.claims
    }

    #[instrument(skip_all, name = "jwt_auth.access.entity")]
    async fn authorize(&self, headers: &HeaderMap) -> Result<AuthenticatedUser<U>, AuthError> {
        let principal = self.authenticator.authenticate_user_from(headers).await?;

        if !intersects(principal.user.role_names(), &self.required_roles) {
            tracing::debug!(
                target: "jwt_auth.access",
                required = ?self.required_roles,
                "User holds none of the required roles"
            );
            return Err(AuthError::no_privileges());
        }

        Ok(principal)
    }
}
