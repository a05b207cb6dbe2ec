//! Claim-level validation of decoded tokens.
//!
//! The validator is a checklist: each check inspects the claims against the
//! current time and may report one issue. New checks can be appended
//! without changing callers.

use crate::auth::claims::TokenClaims;
use crate::errors::messages;
use std::fmt;

/// A claim-level problem found by the validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationIssue {
    /// `exp` is not strictly in the future.
    RefreshTokenExpired,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::RefreshTokenExpired => f.write_str(messages::REFRESH_TOKEN_EXPIRED),
        }
    }
}

/// A single check: claims and current Unix time in, optional issue out.
pub type ClaimCheck = fn(&TokenClaims, i64) -> Option<ValidationIssue>;

/// Ordered list of claim checks.
#[derive(Clone)]
pub struct TokenValidator {
    checks: Vec<ClaimCheck>,
}

impl Default for TokenValidator {
    fn default() -> Self {
        Self {
            checks: vec![check_not_expired as ClaimCheck],
        }
    }
}

impl fmt::Debug for TokenValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenValidator")
            .field("checks", &self.checks.len())
            .finish()
    }
}

impl TokenValidator {
    /// Append a check to the end of the list.
    pub fn with_check(mut self, check: ClaimCheck) -> Self {
        self.checks.push(check);
        self
    }

    /// Run every check. An empty result means the claims are valid.
    pub fn validate(&self, claims: &TokenClaims, now: i64) -> Vec<ValidationIssue> {
        self.checks
            .iter()
            .filter_map(|check| check(claims, now))
            .collect()
    }
}

fn check_not_expired(claims: &TokenClaims, now: i64) -> Option<ValidationIssue> {
    (claims.exp <= now).then_some(ValidationIssue::RefreshTokenExpired)
}
