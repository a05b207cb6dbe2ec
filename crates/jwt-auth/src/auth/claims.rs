//! Token claims structure.
//!
//! Carries the mandatory claims (`sub`, `exp`, `iat`, `jti`), the optional
//! embedded `roles` list, and any application-supplied claims. The `sub`
//! and `jti` fields are redacted in Debug output.

use crate::errors::AuthError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::fmt;

/// Claims carried by access and refresh tokens.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject identifier - redacted in Debug output.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,

    /// Expiration timestamp (Unix epoch seconds).
    pub exp: i64,

    /// Issued-at timestamp (Unix epoch seconds).
    pub iat: i64,

    /// Unique token identifier - redacted in Debug output.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,

    /// Role labels embedded at issuance.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub roles: Vec<String>,

    /// Any other application-supplied claims.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl fmt::Debug for TokenClaims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenClaims")
            .field("sub", &self.sub.as_ref().map(|_| "[REDACTED]"))
            .field("exp", &self.exp)
            .field("iat", &self.iat)
            .field("jti", &self.jti.as_ref().map(|_| "[REDACTED]"))
            .field("roles", &self.roles)
            .field("extra", &self.extra.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl TokenClaims {
    /// Build claims from application-supplied claims plus the reserved ones.
    ///
    /// `exp`, `iat` and `jti` always come from the arguments; values for
    /// those names in `extra` are discarded.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Internal` if `sub` or `roles` in `extra` have the
    /// wrong JSON type.
    pub fn issue(
        mut extra: Map<String, Value>,
        iat: i64,
        exp: i64,
        jti: String,
    ) -> Result<Self, AuthError> {
        extra.insert("iat".to_string(), Value::from(iat));
        extra.insert("exp".to_string(), Value::from(exp));
        extra.insert("jti".to_string(), Value::from(jti));

        serde_json::from_value(Value::Object(extra)).map_err(|e| {
            tracing::error!(target: "jwt_auth.claims", error = %e, "Application claims have invalid types");
            AuthError::Internal(format!("invalid application claims: {e}"))
        })
    }

    /// Subject identifier, if present and non-empty.
    pub fn subject(&self) -> Option<&str> {
        self.sub.as_deref().filter(|sub| !sub.is_empty())
    }

    /// Returns true if any embedded role is in `required`.
    pub fn has_any_role<S: AsRef<str>>(&self, required: &[S]) -> bool {
        intersects(self.roles.iter().map(String::as_str), required)
    }
}

/// Returns true if `held` and `required` share at least one role label.
pub fn intersects<'a, I, S>(held: I, required: &[S]) -> bool
where
    I: IntoIterator<Item = &'a str>,
    S: AsRef<str>,
{
    let held: HashSet<&str> = held.into_iter().collect();
    required.iter().any(|role| held.contains(role.as_ref()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_claims() -> TokenClaims {
        let extra = json!({"sub": "user-42", "roles": ["admin"], "org": "acme"});
        TokenClaims::issue(
            extra.as_object().cloned().unwrap(),
            1_700_000_000,
            1_700_001_800,
            "jti-1".to_string(),
        )
        .unwrap()
    }

    #[test]
    fn test_issue_merges_extra_claims() {
        let claims = sample_claims();

        assert_eq!(claims.sub.as_deref(), Some("user-42"));
        assert_eq!(claims.roles, vec!["admin"]);
        assert_eq!(claims.extra.get("org"), Some(&json!("acme")));
        assert!(!claims.extra.contains_key("exp"));
    }

    #[test]
    fn test_issue_ignores_reserved_overrides() {
        let extra = json!({"sub": "u", "exp": 1, "iat": 2, "jti": "forged"});
        let claims = TokenClaims::issue(
            extra.as_object().cloned().unwrap(),
            1_700_000_000,
            1_700_000_060,
            "real".to_string(),
        )
        .unwrap();

        assert_eq!(claims.iat, 1_700_000_000);
        assert_eq!(claims.exp, 1_700_000_060);
        assert_eq!(claims.jti.as_deref(), Some("real"));
    }

    #[test]
    fn test_issue_rejects_non_string_sub() {
        let extra = json!({"sub": 42});
        let result = TokenClaims::issue(extra.as_object().cloned().unwrap(), 0, 60, "j".into());
        assert!(matches!(result, Err(AuthError::Internal(_))));
    }

    #[test]
    fn test_debug_redacts_sub_and_jti() {
        let debug_str = format!("{:?}", sample_claims());

        assert!(!debug_str.contains("user-42"));
        assert!(!debug_str.contains("jti-1"));
        assert!(debug_str.contains("[REDACTED]"));
        assert!(debug_str.contains("admin"));
    }

    #[test]
    fn test_missing_roles_default_to_empty() {
        let claims: TokenClaims =
            serde_json::from_value(json!({"sub": "u", "exp": 10, "iat": 5})).unwrap();

        assert!(claims.roles.is_empty());
        assert!(claims.jti.is_none());
        assert!(!claims.has_any_role(&["admin"]));
    }

    #[test]
    fn test_empty_sub_is_not_a_subject() {
        let claims: TokenClaims =
            serde_json::from_value(json!({"sub": "", "exp": 10, "iat": 5})).unwrap();
        assert_eq!(claims.subject(), None);
    }

    #[test]
    fn test_has_any_role() {
        let claims = sample_claims();

        assert!(claims.has_any_role(&["admin", "editor"]));
        assert!(!claims.has_any_role(&["viewer"]));
        assert!(!claims.has_any_role::<&str>(&[]));
    }

    #[test]
    fn test_serialization_round_trip() {
        let claims = sample_claims();

        let json = serde_json::to_string(&claims).unwrap();
        let deserialized: TokenClaims = serde_json::from_str(&json).unwrap();

        assert_eq!(deserialized, claims);
    }
}
