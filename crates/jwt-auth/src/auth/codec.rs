//! Token encoding and decoding.
//!
//! Access and refresh tokens are compact JWS strings signed with an HMAC
//! algorithm. Each kind has its own secret, so a token signed with one key
//! never verifies under the other.
//!
//! # Security
//!
//! - Tokens are size-checked BEFORE parsing (DoS prevention)
//! - Only the configured algorithm is accepted on decode
//! - Decoding does not check `exp`; callers apply the expiry rule they need

use crate::auth::claims::TokenClaims;
use crate::auth::validator::TokenValidator;
use crate::clock::{Clock, SystemClock};
use crate::config::AuthConfig;
use crate::errors::{messages, AuthError};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

/// Maximum accepted token size in bytes (8KB).
///
/// Larger tokens are rejected before base64 decoding or signature checks.
pub const MAX_JWT_SIZE_BYTES: usize = 8192;

/// Create a signed token from application claims.
///
/// Sets `iat` to the clock's current time, `exp` to `iat + ttl_minutes` and
/// `jti` to a fresh random UUID, merges `extra`, then signs.
///
/// # Errors
///
/// Returns `AuthError::Internal` if `ttl_minutes` is not positive, the
/// claims have invalid types, or signing fails.
pub fn create_token(
    extra: Map<String, Value>,
    ttl_minutes: i64,
    secret_key: &SecretString,
    algorithm: Algorithm,
    clock: &dyn Clock,
) -> Result<(String, TokenClaims), AuthError> {
    let ttl_seconds = ttl_minutes
        .checked_mul(60)
        .filter(|secs| *secs > 0)
        .ok_or_else(|| AuthError::Internal(format!("invalid token lifetime: {ttl_minutes}m")))?;

    let iat = clock.timestamp();
    let exp = iat
        .checked_add(ttl_seconds)
        .ok_or_else(|| AuthError::Internal("token expiry overflows".to_string()))?;

    let claims = TokenClaims::issue(extra, iat, exp, Uuid::new_v4().to_string())?;
    let token = encode_claims(&claims, secret_key, algorithm)?;

    Ok((token, claims))
}

/// Sign already-built claims.
pub fn encode_claims(
    claims: &TokenClaims,
    secret_key: &SecretString,
    algorithm: Algorithm,
) -> Result<String, AuthError> {
    let encoding_key = EncodingKey::from_secret(secret_key.expose_secret().as_bytes());

    encode(&Header::new(algorithm), claims, &encoding_key).map_err(|e| {
        tracing::error!(target: "jwt_auth.codec", error = %e, "Token signing failed");
        AuthError::Internal(format!("token signing failed: {e}"))
    })
}

/// Verify a token's signature and structure and return its claims.
///
/// Does NOT check `exp`.
///
/// # Errors
///
/// Returns `AuthError::Unauthorized("invalid token access: <cause>")` when
/// the token is oversized, malformed, signed with another key, or signed
/// with another algorithm.
pub fn decode_token(
    token: &str,
    secret_key: &SecretString,
    algorithm: Algorithm,
) -> Result<TokenClaims, AuthError> {
    if token.len() > MAX_JWT_SIZE_BYTES {
        tracing::debug!(
            target: "jwt_auth.codec",
            token_size = token.len(),
            max_size = MAX_JWT_SIZE_BYTES,
            "Token rejected: size exceeds maximum allowed"
        );
        return Err(AuthError::unauthorized(messages::invalid_token_access(
            "token too large",
        )));
    }

    let decoding_key = DecodingKey::from_secret(secret_key.expose_secret().as_bytes());

    let mut validation = Validation::new(algorithm);
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    let token_data = decode::<TokenClaims>(token, &decoding_key, &validation).map_err(|e| {
        tracing::debug!(target: "jwt_auth.codec", error = %e, "Token verification failed");
        AuthError::unauthorized(messages::invalid_token_access(e))
    })?;

    Ok(token_data.claims)
}

/// Issues and decodes access/refresh tokens with the configured keys.
#[derive(Clone)]
pub struct TokenCodec {
    config: Arc<AuthConfig>,
    clock: Arc<dyn Clock>,
    validator: TokenValidator,
}

impl TokenCodec {
    /// Create a codec using the wall clock in the configured time zone.
    pub fn new(config: Arc<AuthConfig>) -> Self {
        let clock = Arc::new(SystemClock::new(config.timezone));
        Self::with_clock(config, clock)
    }

    /// Create a codec with an explicit time source.
    pub fn with_clock(config: Arc<AuthConfig>, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            clock,
            validator: TokenValidator::default(),
        }
    }

    /// Replace the claim validator used for refresh tokens.
    pub fn with_validator(mut self, validator: TokenValidator) -> Self {
        self.validator = validator;
        self
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    /// Create an access token valid for the configured access lifetime.
    #[instrument(skip_all)]
    pub fn create_access_token(&self, extra: Map<String, Value>) -> Result<String, AuthError> {
        let jwt = &self.config.jwt;
        let (token, _) = create_token(
            extra,
            jwt.access_expire_minutes,
            &jwt.access_key,
            jwt.algorithm,
            self.clock(),
        )?;
        Ok(token)
    }

    /// Create a refresh token and return it together with its claims.
    #[instrument(skip_all)]
    pub fn create_refresh_token(
        &self,
        extra: Map<String, Value>,
    ) -> Result<(String, TokenClaims), AuthError> {
        let jwt = &self.config.jwt;
        create_token(
            extra,
            jwt.refresh_expire_minutes,
            &jwt.refresh_key,
            jwt.algorithm,
            self.clock(),
        )
    }

    /// Verify an access token's signature. Expiry is left to the caller.
    pub fn decode_access(&self, token: &str) -> Result<TokenClaims, AuthError> {
        let jwt = &self.config.jwt;
        decode_token(token, &jwt.access_key, jwt.algorithm)
    }

    /// Verify a refresh token and run the claim validator on it.
    ///
    /// # Errors
    ///
    /// - `Unauthorized("invalid token access: <cause>")` on signature failure
    /// - `Unauthorized("refresh token expired")` when validation reports issues
    #[instrument(skip_all)]
    pub fn decode_refresh(&self, token: &str) -> Result<TokenClaims, AuthError> {
        let jwt = &self.config.jwt;
        let claims = decode_token(token, &jwt.refresh_key, jwt.algorithm)?;

        let issues = self.validator.validate(&claims, self.clock.timestamp());
        if !issues.is_empty() {
            let reasons: Vec<String> = issues.iter().map(ToString::to_string).collect();
            tracing::debug!(target: "jwt_auth.codec", issues = ?reasons, "Refresh token failed validation");
            return Err(AuthError::Unauthorized(reasons.join(", ")));
        }

        Ok(claims)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::config::JwtSettings;
    use chrono_tz::Tz;
    use serde_json::json;

    const T0: i64 = 1_700_000_000;

    fn test_config() -> Arc<AuthConfig> {
        let jwt = JwtSettings::new(
            Algorithm::HS256,
            SecretString::from("access-secret"),
            SecretString::from("refresh-secret"),
        )
        .unwrap();
        Arc::new(AuthConfig::new(jwt))
    }

    fn extra(value: serde_json::Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_create_token_sets_timestamps() {
        let clock = FixedClock::at(T0, Tz::UTC);
        let key = SecretString::from("k");

        let (_, claims) =
            create_token(extra(json!({"sub": "u"})), 30, &key, Algorithm::HS256, &clock).unwrap();

        assert_eq!(claims.iat, T0);
        assert_eq!(claims.exp, T0 + 30 * 60);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_create_token_generates_unique_jti() {
        let clock = FixedClock::at(T0, Tz::UTC);
        let key = SecretString::from("k");

        let (_, first) = create_token(Map::new(), 5, &key, Algorithm::HS256, &clock).unwrap();
        let (_, second) = create_token(Map::new(), 5, &key, Algorithm::HS256, &clock).unwrap();

        assert_ne!(first.jti, second.jti);
    }

    #[test]
    fn test_create_token_rejects_non_positive_ttl() {
        let clock = FixedClock::at(T0, Tz::UTC);
        let key = SecretString::from("k");

        let result = create_token(Map::new(), 0, &key, Algorithm::HS256, &clock);
        assert!(matches!(result, Err(AuthError::Internal(_))));
    }

    #[test]
    fn test_round_trip() {
        let clock = FixedClock::at(T0, Tz::UTC);
        let key = SecretString::from("k");

        let (token, claims) = create_token(
            extra(json!({"sub": "u", "roles": ["admin"], "org": "acme"})),
            30,
            &key,
            Algorithm::HS384,
            &clock,
        )
        .unwrap();

        assert_eq!(token.split('.').count(), 3);
        assert_eq!(decode_token(&token, &key, Algorithm::HS384).unwrap(), claims);
    }

    #[test]
    fn test_decode_does_not_check_expiry() {
        let clock = FixedClock::at(T0, Tz::UTC);
        let key = SecretString::from("k");

        let (token, claims) = create_token(Map::new(), 1, &key, Algorithm::HS256, &clock).unwrap();

        // Issued in 2023 and long expired
        assert_eq!(decode_token(&token, &key, Algorithm::HS256).unwrap(), claims);
    }

    #[test]
    fn test_decode_rejects_wrong_key() {
        let clock = FixedClock::at(T0, Tz::UTC);
        let (token, _) = create_token(
            Map::new(),
            5,
            &SecretString::from("one"),
            Algorithm::HS256,
            &clock,
        )
        .unwrap();

        let result = decode_token(&token, &SecretString::from("two"), Algorithm::HS256);
        assert!(
            matches!(&result, Err(AuthError::Unauthorized(msg)) if msg.starts_with("invalid token access: ")),
            "Expected Unauthorized, got {:?}",
            result
        );
    }

    #[test]
    fn test_decode_rejects_algorithm_mismatch() {
        let clock = FixedClock::at(T0, Tz::UTC);
        let key = SecretString::from("k");
        let (token, _) = create_token(Map::new(), 5, &key, Algorithm::HS512, &clock).unwrap();

        let result = decode_token(&token, &key, Algorithm::HS256);
        assert!(matches!(result, Err(AuthError::Unauthorized(_))));
    }

    #[test]
    fn test_decode_rejects_malformed_token() {
        let key = SecretString::from("k");

        for token in ["", "not-a-jwt", "a.b", "a.b.c"] {
            let result = decode_token(token, &key, Algorithm::HS256);
            assert!(
                matches!(result, Err(AuthError::Unauthorized(_))),
                "token {token:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_decode_rejects_oversized_token() {
        let key = SecretString::from("k");
        let oversized = "a".repeat(MAX_JWT_SIZE_BYTES + 1);

        let result = decode_token(&oversized, &key, Algorithm::HS256);
        assert!(
            matches!(&result, Err(AuthError::Unauthorized(msg)) if msg.contains("too large")),
            "Expected size rejection, got {:?}",
            result
        );
    }

    #[test]
    fn test_access_token_never_decodes_as_refresh() {
        let codec = TokenCodec::with_clock(test_config(), Arc::new(FixedClock::at(T0, Tz::UTC)));

        let access = codec.create_access_token(extra(json!({"sub": "u"}))).unwrap();
        let (refresh, _) = codec.create_refresh_token(extra(json!({"sub": "u"}))).unwrap();

        assert!(codec.decode_access(&access).is_ok());
        assert!(matches!(
            codec.decode_access(&refresh),
            Err(AuthError::Unauthorized(_))
        ));
        assert!(matches!(
            codec.decode_refresh(&access),
            Err(AuthError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_access_token_uses_configured_lifetime() {
        let codec = TokenCodec::with_clock(test_config(), Arc::new(FixedClock::at(T0, Tz::UTC)));

        let token = codec.create_access_token(Map::new()).unwrap();
        let claims = codec.decode_access(&token).unwrap();

        assert_eq!(claims.exp - claims.iat, 30 * 60);
    }

    #[test]
    fn test_decode_refresh_reports_expiry() {
        let config = test_config();
        let issuing = TokenCodec::with_clock(config.clone(), Arc::new(FixedClock::at(T0, Tz::UTC)));
        let (refresh, _) = issuing.create_refresh_token(Map::new()).unwrap();

        let later = T0 + config.jwt.refresh_expire_minutes * 60 + 1;
        let checking = TokenCodec::with_clock(config, Arc::new(FixedClock::at(later, Tz::UTC)));

        let result = checking.decode_refresh(&refresh);
        assert!(
            matches!(&result, Err(AuthError::Unauthorized(msg)) if msg == "refresh token expired"),
            "Expected refresh expiry, got {:?}",
            result
        );
    }

    #[test]
    fn test_decode_refresh_accepts_live_token() {
        let codec = TokenCodec::with_clock(test_config(), Arc::new(FixedClock::at(T0, Tz::UTC)));
        let (refresh, claims) = codec.create_refresh_token(extra(json!({"sub": "u"}))).unwrap();

        assert_eq!(codec.decode_refresh(&refresh).unwrap(), claims);
    }
}
