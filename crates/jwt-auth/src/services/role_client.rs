//! Remote role service HTTP client.
//!
//! Used by hard-check access control to read a subject's current roles from
//! an authoritative service instead of trusting roles embedded in the token.
//!
//! # Protocol
//!
//! `GET {base_url}/api/v1/roles/{subject}` with the caller's Authorization
//! header forwarded verbatim and no other request headers. The subject is
//! percent-encoded as a single path segment. A 200 response
//! carries a JSON array of `{"name": "...", ...}` records.
//!
//! Non-200 statuses and transport failures are retried with jittered
//! exponential backoff. A 200 whose body does not decode is not retried.

use crate::config::RoleServiceConfig;
use crate::errors::AuthError;
use crate::retry::{Attempt, RetryPolicy};
use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, StatusCode, Url};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::{error, instrument, warn};

/// Connect timeout for role service requests in seconds.
const CONNECT_TIMEOUT_SECS: u64 = 5;

/// A role as reported by the role service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleRecord {
    /// Role label compared against required roles.
    pub name: String,

    /// Any other fields the service returns.
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl RoleRecord {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Map::new(),
        }
    }
}

/// Trait for role lookups, mockable for tests.
#[async_trait]
pub trait RoleResolver: Send + Sync {
    /// Fetch the current roles of `subject_id`.
    ///
    /// `authorization` is the inbound request's Authorization header value,
    /// forwarded unchanged.
    async fn fetch_roles(
        &self,
        subject_id: &str,
        authorization: &str,
    ) -> Result<Vec<RoleRecord>, AuthError>;
}

/// HTTP implementation of [`RoleResolver`].
#[derive(Clone)]
pub struct HttpRoleResolver {
    /// HTTP client with configured timeouts.
    client: Client,

    /// Base URL of the role service, without trailing slash.
    base_url: String,

    /// Parsed base URL that role paths are appended to.
    endpoint: Url,

    retry: RetryPolicy,
}

impl HttpRoleResolver {
    /// Create a client for the configured role service.
    ///
    /// # Errors
    ///
    /// - `AuthError::Configuration` if the base URL is not an absolute
    ///   http(s) URL
    /// - `AuthError::Internal` if the HTTP client cannot be built
    pub fn new(config: &RoleServiceConfig) -> Result<Self, AuthError> {
        let base_url = config.base_url.trim_end_matches('/').to_string();
        let endpoint = Url::parse(&base_url)
            .ok()
            .filter(|url| !url.cannot_be_a_base())
            .ok_or_else(|| {
                error!(target: "jwt_auth.roles", base_url = %base_url, "Invalid role service URL");
                AuthError::Configuration(format!("invalid role service URL: {base_url}"))
            })?;

        let client = Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS).min(config.request_timeout))
            .build()
            .map_err(|e| {
                error!(target: "jwt_auth.roles", error = %e, "Failed to build HTTP client");
                AuthError::Internal("failed to build role service client".to_string())
            })?;

        Ok(Self {
            client,
            base_url,
            endpoint,
            retry: config.retry.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// URL of the roles resource for `subject_id`.
    ///
    /// `/`, `?` and `#` in the subject are escaped, so it always names one
    /// resource under `/api/v1/roles/`.
    pub fn roles_url(&self, subject_id: &str) -> Result<Url, AuthError> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|()| {
                AuthError::Configuration(format!("invalid role service URL: {}", self.base_url))
            })?
            .pop_if_empty()
            .extend(["api", "v1", "roles", subject_id]);
        Ok(url)
    }

    async fn fetch_once(
        &self,
        url: &str,
        authorization: &str,
        attempt: u32,
    ) -> Result<Vec<RoleRecord>, Attempt<AuthError>> {
        let response = self
            .client
            .get(url)
            .header(AUTHORIZATION, authorization)
            .send()
            .await
            .map_err(|e| {
                warn!(target: "jwt_auth.roles", error = %e, attempt, "Role service request failed");
                Attempt::Retry(AuthError::Upstream(format!("role service unreachable: {e}")))
            })?;

        let status = response.status();
        if status != StatusCode::OK {
            warn!(target: "jwt_auth.roles", status = %status, attempt, "Role service returned non-200");
            return Err(Attempt::Retry(AuthError::Upstream(format!(
                "role service returned {status}"
            ))));
        }

        let body = response.bytes().await.map_err(|e| {
            warn!(target: "jwt_auth.roles", error = %e, attempt, "Failed to read role service body");
            Attempt::Retry(AuthError::Upstream(format!(
                "role service body unreadable: {e}"
            )))
        })?;

        serde_json::from_slice(&body).map_err(|e| {
            error!(target: "jwt_auth.roles", error = %e, "Role service returned malformed roles");
            Attempt::Abort(AuthError::Upstream(format!(
                "role service returned malformed roles: {e}"
            )))
        })
    }
}

#[async_trait]
impl RoleResolver for HttpRoleResolver {
    /// # Errors
    ///
    /// `AuthError::Upstream` when every attempt failed or the response body
    /// could not be decoded.
    #[instrument(skip_all, name = "jwt_auth.roles.fetch")]
    async fn fetch_roles(
        &self,
        subject_id: &str,
        authorization: &str,
    ) -> Result<Vec<RoleRecord>, AuthError> {
        let url = self.roles_url(subject_id)?;

        self.retry
            .run(|attempt| self.fetch_once(url.as_str(), authorization, attempt))
            .await
    }
}

/// Mock role resolver for testing.
pub mod mock {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Mock role resolver returning a fixed role list or a fixed error.
    pub struct MockRoleResolver {
        /// Roles returned on success.
        roles: Vec<RoleRecord>,
        /// Whether to return an upstream error.
        return_error: bool,
        call_count: AtomicUsize,
        /// Last (subject, authorization) pair received.
        last_call: Mutex<Option<(String, String)>>,
    }

    impl MockRoleResolver {
        /// Create a mock that reports the given role names.
        pub fn returning<S: AsRef<str>>(names: &[S]) -> Self {
            Self {
                roles: names.iter().map(|n| RoleRecord::named(n.as_ref())).collect(),
                return_error: false,
                call_count: AtomicUsize::new(0),
                last_call: Mutex::new(None),
            }
        }

        /// Create a mock whose lookups always fail as if retries ran out.
        pub fn failing() -> Self {
            Self {
                roles: vec![],
                return_error: true,
                call_count: AtomicUsize::new(0),
                last_call: Mutex::new(None),
            }
        }

        /// Get the number of calls made.
        pub fn call_count(&self) -> usize {
            self.call_count.load(Ordering::SeqCst)
        }

        /// Get the last subject and forwarded Authorization value.
        pub fn last_call(&self) -> Option<(String, String)> {
            self.last_call.lock().ok().and_then(|guard| guard.clone())
        }
    }

    #[async_trait]
    impl RoleResolver for MockRoleResolver {
        async fn fetch_roles(
            &self,
            subject_id: &str,
            authorization: &str,
        ) -> Result<Vec<RoleRecord>, AuthError> {
            self.call_count.fetch_add(1, Ordering::SeqCst);
            if let Ok(mut guard) = self.last_call.lock() {
                *guard = Some((subject_id.to_string(), authorization.to_string()));
            }

            if self.return_error {
                return Err(AuthError::Upstream("mock role service error".to_string()));
            }

            Ok(self.roles.clone())
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::mock::MockRoleResolver;
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_role_record_keeps_extra_fields() {
        let records: Vec<RoleRecord> = serde_json::from_str(
            r#"[{"name":"editor","id":7,"scope":"org"},{"name":"viewer"}]"#,
        )
        .unwrap();

        assert_eq!(records.len(), 2);
        let editor = records.first().unwrap();
        assert_eq!(editor.name, "editor");
        assert_eq!(editor.attributes.get("id"), Some(&Value::from(7)));
        assert_eq!(records.last(), Some(&RoleRecord::named("viewer")));
    }

    #[test]
    fn test_role_record_requires_name() {
        let result: Result<Vec<RoleRecord>, _> = serde_json::from_str(r#"[{"id":7}]"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_new_trims_trailing_slash() {
        let config = RoleServiceConfig {
            base_url: "http://roles.local/".to_string(),
            ..RoleServiceConfig::default()
        };
        let resolver = HttpRoleResolver::new(&config).unwrap();
        assert_eq!(resolver.base_url(), "http://roles.local");
    }

    #[test]
    fn test_new_rejects_unparseable_url() {
        let config = RoleServiceConfig::new("roles.local:8000/no-scheme");
        let result = HttpRoleResolver::new(&config);
        assert!(matches!(result, Err(AuthError::Configuration(_))));
    }

    #[test]
    fn test_roles_url_keeps_base_path() {
        let resolver = HttpRoleResolver::new(&RoleServiceConfig::new("http://gw.local/auth/")).unwrap();
        assert_eq!(
            resolver.roles_url("user-1").unwrap().as_str(),
            "http://gw.local/auth/api/v1/roles/user-1"
        );
    }

    #[test]
    fn test_roles_url_escapes_subject_as_one_segment() {
        let resolver = HttpRoleResolver::new(&RoleServiceConfig::new("http://roles.local")).unwrap();
        let url = resolver.roles_url("team/../admin?all=1#frag").unwrap();

        assert_eq!(url.path(), "/api/v1/roles/team%2F..%2Fadmin%3Fall=1%23frag");
        assert!(url.query().is_none());
        assert!(url.fragment().is_none());
    }

    #[tokio::test]
    async fn test_mock_records_calls() {
        let mock = Arc::new(MockRoleResolver::returning(&["admin"]));
        let roles = mock.fetch_roles("user-1", "Bearer abc").await.unwrap();

        assert_eq!(roles, vec![RoleRecord::named("admin")]);
        assert_eq!(mock.call_count(), 1);
        assert_eq!(
            mock.last_call(),
            Some(("user-1".to_string(), "Bearer abc".to_string()))
        );
    }

    #[tokio::test]
    async fn test_mock_failing_returns_upstream() {
        let mock = MockRoleResolver::failing();
        let err = mock.fetch_roles("user-1", "Bearer abc").await.unwrap_err();
        assert!(matches!(err, AuthError::Upstream(_)));
    }
}
