//! Custom test assertions for expressive tests
//!
//! Provides trait-based assertions on authentication results.

use jwt_auth::errors::messages;
use jwt_auth::AuthError;
use std::fmt::Debug;

/// Assertions on `Result<T, AuthError>`
///
/// # Example
/// ```rust,ignore
/// authenticator
///     .authenticate_claims(Some(&header))
///     .await
///     .assert_unauthorized("token deactivated");
/// ```
pub trait AuthResultAssertions<T> {
    /// Assert success and return the value
    fn assert_ok(self) -> T;

    /// Assert `Unauthorized` with exactly `message`
    fn assert_unauthorized(self, message: &str);

    /// Assert `Unauthorized` whose message starts with `prefix`
    fn assert_unauthorized_starting_with(self, prefix: &str);

    /// Assert `Forbidden("no privileges")`
    fn assert_forbidden(self);

    /// Assert `Upstream`
    fn assert_upstream(self);

    /// Assert `Configuration`
    fn assert_configuration(self);
}

impl<T: Debug> AuthResultAssertions<T> for Result<T, AuthError> {
    fn assert_ok(self) -> T {
        match self {
            Ok(value) => value,
            Err(e) => panic!("expected success, got {e:?}"),
        }
    }

    fn assert_unauthorized(self, message: &str) {
        match self {
            Err(AuthError::Unauthorized(actual)) => assert_eq!(actual, message),
            other => panic!("expected Unauthorized({message:?}), got {other:?}"),
        }
    }

    fn assert_unauthorized_starting_with(self, prefix: &str) {
        match self {
            Err(AuthError::Unauthorized(actual)) => assert!(
                actual.starts_with(prefix),
                "expected message starting with {prefix:?}, got {actual:?}"
            ),
            other => panic!("expected Unauthorized({prefix:?}...), got {other:?}"),
        }
    }

    fn assert_forbidden(self) {
        match self {
            Err(AuthError::Forbidden(actual)) => assert_eq!(actual, messages::NO_PRIVILEGES),
            other => panic!("expected Forbidden, got {other:?}"),
        }
    }

    fn assert_upstream(self) {
        match self {
            Err(AuthError::Upstream(_)) => {}
            other => panic!("expected Upstream, got {other:?}"),
        }
    }

    fn assert_configuration(self) {
        match self {
            Err(AuthError::Configuration(_)) => {}
            other => panic!("expected Configuration, got {other:?}"),
        }
    }
}
