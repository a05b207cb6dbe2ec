//! Builder patterns for test tokens
//!
//! Provides a fluent API for claims that the production issuer would never
//! produce: missing subjects, past expiries, chosen `jti` values.

use crate::test_ids::{TEST_ACCESS_KEY, TEST_NOW, TEST_USER_ALICE};
use jsonwebtoken::Algorithm;
use jwt_auth::auth::codec::encode_claims;
use jwt_auth::TokenClaims;
use secrecy::SecretString;
use serde_json::{Map, Value};

/// Builder for signed test tokens
///
/// # Example
/// ```rust,ignore
/// let token = TestTokenBuilder::new()
///     .for_user("alice")
///     .with_roles(&["admin"])
///     .expires_at(TEST_NOW - 1)
///     .sign();
/// ```
#[derive(Debug, Clone)]
pub struct TestTokenBuilder {
    claims: TokenClaims,
    key: String,
    algorithm: Algorithm,
}

impl TestTokenBuilder {
    /// Token for [`TEST_USER_ALICE`], issued at [`TEST_NOW`], valid for an
    /// hour, signed with the test access key.
    pub fn new() -> Self {
        Self {
            claims: TokenClaims {
                sub: Some(TEST_USER_ALICE.to_string()),
                exp: TEST_NOW + 3600,
                iat: TEST_NOW,
                jti: Some("test-jti".to_string()),
                roles: vec![],
                extra: Map::new(),
            },
            key: TEST_ACCESS_KEY.to_string(),
            algorithm: Algorithm::HS256,
        }
    }

    /// Set the subject
    pub fn for_user(mut self, subject: impl ToString) -> Self {
        self.claims.sub = Some(subject.to_string());
        self
    }

    /// Drop the subject claim entirely
    pub fn without_subject(mut self) -> Self {
        self.claims.sub = None;
        self
    }

    /// Set the embedded roles
    pub fn with_roles(mut self, roles: &[&str]) -> Self {
        self.claims.roles = roles.iter().map(ToString::to_string).collect();
        self
    }

    /// Set the token identifier
    pub fn with_jti(mut self, jti: &str) -> Self {
        self.claims.jti = Some(jti.to_string());
        self
    }

    /// Set issued-at timestamp
    pub fn issued_at(mut self, timestamp: i64) -> Self {
        self.claims.iat = timestamp;
        self
    }

    /// Set expiration timestamp
    pub fn expires_at(mut self, timestamp: i64) -> Self {
        self.claims.exp = timestamp;
        self
    }

    /// Add an application claim
    pub fn with_claim(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.claims.extra.insert(name.to_string(), value.into());
        self
    }

    /// Sign with a different secret
    pub fn signed_with(mut self, key: &str) -> Self {
        self.key = key.to_string();
        self
    }

    /// Sign with a different HMAC algorithm
    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// The claims as built
    pub fn claims(&self) -> TokenClaims {
        self.claims.clone()
    }

    /// Sign and return the compact token
    pub fn sign(self) -> String {
        encode_claims(&self.claims, &SecretString::from(self.key), self.algorithm)
            .expect("test token signing failed")
    }

    /// Sign and return an Authorization header value
    pub fn bearer(self) -> String {
        format!("Bearer {}", self.sign())
    }
}

impl Default for TestTokenBuilder {
    fn default() -> Self {
        Self::new()
    }
}
