//! Access-token session authentication.
//!
//! Verifies a bearer credential in strict sequence, failing closed at the
//! first gate that does not pass:
//!
//! 1. Extract `Bearer <token>` from the Authorization header
//! 2. Verify signature/structure under the access key
//! 3. Reject tokens whose `exp` is in the past
//! 4. Require a `sub` claim
//! 5. Reject tokens revoked per the subject's revocation record
//! 6. Resolve the subject to a user (strict flow only)
//!
//! The claims flow stops after step 5 and yields the claims themselves.

use crate::auth::claims::TokenClaims;
use crate::auth::codec::TokenCodec;
use crate::auth::revocation::{is_token_available, RevocationOracle};
use crate::auth::users::UserLookup;
use crate::config::AuthConfig;
use crate::errors::{messages, AuthError};
use axum::http::{header::AUTHORIZATION, HeaderMap};
use std::sync::Arc;
use tracing::instrument;

/// A user resolved by the strict flow, with the claims it was resolved from.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser<U> {
    pub user: U,
    pub claims: TokenClaims,
}

/// Returns the raw Authorization header value, if present and valid UTF-8.
pub fn authorization_header(headers: &HeaderMap) -> Option<&str> {
    headers.get(AUTHORIZATION).and_then(|h| h.to_str().ok())
}

/// Extracts the token from a `Bearer <token>` header value.
///
/// The scheme is matched case-insensitively. Any other scheme, or an empty
/// token, yields `None`.
pub fn extract_bearer(authorization: &str) -> Option<&str> {
    let (scheme, token) = authorization.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

/// Authenticates requests carrying access tokens.
///
/// `U` is the user type produced by the optional user lookup. Authenticators
/// built without one can only run the claims flow.
pub struct SessionAuthenticator<U = ()> {
    codec: TokenCodec,
    revocations: Arc<dyn RevocationOracle>,
    users: Option<Arc<dyn UserLookup<U>>>,
}

impl SessionAuthenticator<()> {
    /// Create an authenticator using the wall clock in the configured zone.
    pub fn new(config: Arc<AuthConfig>, revocations: Arc<dyn RevocationOracle>) -> Self {
        Self::from_codec(TokenCodec::new(config), revocations)
    }

    /// Create an authenticator around an existing codec.
    pub fn from_codec(codec: TokenCodec, revocations: Arc<dyn RevocationOracle>) -> Self {
        Self {
            codec,
            revocations,
            users: None,
        }
    }
}

impl<U> SessionAuthenticator<U> {
    /// Attach the user lookup required by the strict flow.
    pub fn with_user_lookup<V>(self, users: Arc<dyn UserLookup<V>>) -> SessionAuthenticator<V> {
        SessionAuthenticator {
            codec: self.codec,
            revocations: self.revocations,
            users: Some(users),
        }
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    /// Steps 1-3: extract, verify and expiry-check the bearer token.
    ///
    /// # Errors
    ///
    /// - `Unauthorized("invalid token access")` - missing/malformed header
    /// - `Unauthorized("invalid token access: <cause>")` - bad signature/structure
    /// - `Unauthorized("access token expired")` - `exp` before now
    pub fn verify_bearer(&self, authorization: Option<&str>) -> Result<TokenClaims, AuthError> {
        let token = authorization.and_then(extract_bearer).ok_or_else(|| {
            tracing::debug!(target: "jwt_auth.session", "Missing or malformed bearer credential");
            AuthError::unauthorized(messages::INVALID_TOKEN_ACCESS)
        })?;

        let claims = self.codec.decode_access(token)?;

        let now = self.codec.clock().timestamp();
        if claims.exp < now {
            tracing::debug!(target: "jwt_auth.session", exp = claims.exp, now, "Access token expired");
            return Err(AuthError::unauthorized(messages::ACCESS_TOKEN_EXPIRED));
        }

        Ok(claims)
    }

    /// Steps 1-5: the claims flow. Yields the verified claims.
    ///
    /// # Errors
    ///
    /// Everything [`verify_bearer`](Self::verify_bearer) returns, plus
    /// - `Unauthorized("sub not defined")` - no subject claim
    /// - `Unauthorized("token deactivated")` - revoked token
    /// - any error returned by the revocation oracle
    #[instrument(skip_all, name = "jwt_auth.session.claims")]
    pub async fn authenticate_claims(
        &self,
        authorization: Option<&str>,
    ) -> Result<TokenClaims, AuthError> {
        let claims = self.verify_bearer(authorization)?;

        let subject = claims.subject().ok_or_else(|| {
            tracing::debug!(target: "jwt_auth.session", "Token has no subject");
            AuthError::unauthorized(messages::SUB_NOT_DEFINED)
        })?;

        let record = self.revocations.get_from_cache(subject).await?;
        if !is_token_available(record.as_ref(), &claims) {
            tracing::debug!(target: "jwt_auth.session", "Token revoked by logout/disable");
            return Err(AuthError::unauthorized(messages::TOKEN_DEACTIVATED));
        }

        Ok(claims)
    }

    /// Steps 1-6: the strict flow. Yields the resolved user.
    ///
    /// # Errors
    ///
    /// - `Configuration` if no user lookup was attached
    /// - everything [`authenticate_claims`](Self::authenticate_claims) returns
    /// - `Unauthorized("invalid authentication credentials")` - unknown subject
    /// - any error returned by the user lookup
    #[instrument(skip_all, name = "jwt_auth.session.user")]
    pub async fn authenticate_user(
        &self,
        authorization: Option<&str>,
    ) -> Result<AuthenticatedUser<U>, AuthError> {
        let users = self.users.as_ref().ok_or_else(|| {
            tracing::error!(target: "jwt_auth.session", "Strict authentication used without a user lookup");
            AuthError::Configuration("user lookup is not configured".to_string())
        })?;

        let claims = self.authenticate_claims(authorization).await?;

        let subject = claims
            .subject()
            .ok_or_else(|| AuthError::unauthorized(messages::SUB_NOT_DEFINED))?;

        let user = users.find(subject).await?.ok_or_else(|| {
            tracing::debug!(target: "jwt_auth.session", "Subject did not resolve to a user");
            AuthError::unauthorized(messages::INVALID_CREDENTIALS)
        })?;

        Ok(AuthenticatedUser { user, claims })
    }

    /// Claims flow reading the Authorization header from `headers`.
    pub async fn authenticate_claims_from(
        &self,
        headers: &HeaderMap,
    ) -> Result<TokenClaims, AuthError> {
        self.authenticate_claims(authorization_header(headers)).await
    }

    /// Strict flow reading the Authorization header from `headers`.
    pub async fn authenticate_user_from(
        &self,
        headers: &HeaderMap,
    ) -> Result<AuthenticatedUser<U>, AuthError> {
        self.authenticate_user(authorization_header(headers)).await
    }
}
