//! Revocation lookup contract and the token-availability rule.
//!
//! Revocation records are written by an external logout/disable action and
//! read here through a [`RevocationOracle`] supplied by the embedding
//! application.

use crate::auth::claims::TokenClaims;
use crate::errors::AuthError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Per-subject revocation metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevocationRecord {
    /// Identifier of the last explicitly invalidated token.
    pub jti: String,

    /// Moment of the disable action (Unix epoch seconds).
    pub disabled_at: i64,

    /// Whether every token issued at or before `disabled_at` is revoked.
    pub disable_other: bool,
}

impl RevocationRecord {
    /// Returns true if the token described by `claims` is revoked.
    ///
    /// - same `jti` as the record: revoked, regardless of `disable_other`
    /// - `disable_other` set: revoked if issued at or before `disabled_at`
    /// - otherwise: not revoked
    pub fn revokes(&self, claims: &TokenClaims) -> bool {
        if claims.jti.as_deref() == Some(self.jti.as_str()) {
            return true;
        }

        if self.disable_other {
            return claims.iat <= self.disabled_at;
        }

        false
    }
}

/// Returns true if the token is still usable given an optional record.
///
/// Absence of a record means no revocation is in effect.
pub fn is_token_available(record: Option<&RevocationRecord>, claims: &TokenClaims) -> bool {
    record.map_or(true, |record| !record.revokes(claims))
}

/// Source of cached revocation records, keyed by subject.
#[async_trait]
pub trait RevocationOracle: Send + Sync {
    /// Fetch the revocation record for `subject_id`, if any.
    async fn get_from_cache(&self, subject_id: &str)
        -> Result<Option<RevocationRecord>, AuthError>;
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::Map;

    const T0: i64 = 1_700_000_000;

    fn token(jti: &str, iat: i64) -> TokenClaims {
        TokenClaims {
            sub: Some("user".to_string()),
            exp: iat + 3600,
            iat,
            jti: Some(jti.to_string()),
            roles: vec![],
            extra: Map::new(),
        }
    }

    fn record(jti: &str, disable_other: bool) -> RevocationRecord {
        RevocationRecord {
            jti: jti.to_string(),
            disabled_at: T0,
            disable_other,
        }
    }

    #[test]
    fn test_no_record_means_available() {
        assert!(is_token_available(None, &token("X", T0 - 1)));
    }

    #[test]
    fn test_jti_match_dominates_disable_other() {
        let rec = record("X", true);
        assert!(!is_token_available(Some(&rec), &token("X", T0 - 1)));
        assert!(!is_token_available(Some(&rec), &token("X", T0 + 1)));
    }

    #[test]
    fn test_jti_match_without_disable_other() {
        let rec = record("X", false);
        assert!(!is_token_available(Some(&rec), &token("X", T0 + 1)));
    }

    #[test]
    fn test_disable_other_revokes_older_tokens() {
        let rec = record("X", true);
        assert!(!is_token_available(Some(&rec), &token("Y", T0 - 1)));
    }

    #[test]
    fn test_disable_other_revokes_token_issued_at_cutoff() {
        let rec = record("X", true);
        assert!(!is_token_available(Some(&rec), &token("Y", T0)));
    }

    #[test]
    fn test_disable_other_spares_newer_tokens() {
        let rec = record("X", true);
        assert!(is_token_available(Some(&rec), &token("Y", T0 + 1)));
    }

    #[test]
    fn test_other_jti_without_disable_other_is_available() {
        let rec = record("X", false);
        assert!(is_token_available(Some(&rec), &token("Y", T0 - 1)));
    }

    #[test]
    fn test_token_without_jti_never_matches() {
        let rec = record("X", false);
        let mut claims = token("X", T0 - 1);
        claims.jti = None;
        assert!(is_token_available(Some(&rec), &claims));
    }

    #[test]
    fn test_record_deserializes_from_cache_json() {
        let rec: RevocationRecord = serde_json::from_str(
            r#"{"jti":"abc","disabled_at":1700000000,"disable_other":true}"#,
        )
        .unwrap();
        assert_eq!(rec, record("abc", true));
    }
}
