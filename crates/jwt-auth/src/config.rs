//! Authentication configuration.
//!
//! Built once at startup (from environment variables or programmatically)
//! and shared read-only as `Arc<AuthConfig>`. Secret keys are redacted in
//! Debug output.

use crate::retry::{RetryPolicy, DEFAULT_MAX_ATTEMPTS};
use chrono_tz::Tz;
pub use jsonwebtoken::Algorithm;
use secrecy::{ExposeSecret, SecretString};
use std::collections::HashMap;
use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Default access-token lifetime in minutes.
pub const DEFAULT_ACCESS_EXPIRE_MINUTES: i64 = 30;

/// Default refresh-token lifetime in minutes (7 days).
pub const DEFAULT_REFRESH_EXPIRE_MINUTES: i64 = 10_080;

/// Default IANA time zone.
pub const DEFAULT_TIMEZONE: &str = "UTC";

/// Default base URL of the remote role service.
pub const DEFAULT_ROLES_SERVICE_URL: &str = "http://auth-service:8000";

/// Default per-request timeout for the role service in seconds.
pub const DEFAULT_ROLES_REQUEST_TIMEOUT_SECONDS: u64 = 10;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Unsupported JWT algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("Invalid token lifetime: {0}")]
    InvalidExpire(String),

    #[error("Unknown time zone: {0}")]
    UnknownTimezone(String),

    #[error("Access and refresh tokens must be signed with distinct keys")]
    SharedSigningKey,

    #[error("Invalid role service configuration: {0}")]
    InvalidRoleService(String),
}

/// Token signing settings.
#[derive(Clone)]
pub struct JwtSettings {
    /// Symmetric signing algorithm (HS256, HS384 or HS512).
    pub algorithm: Algorithm,

    /// Secret used for access tokens.
    pub access_key: SecretString,

    /// Access-token lifetime in minutes.
    pub access_expire_minutes: i64,

    /// Secret used for refresh tokens. Always distinct from `access_key`.
    pub refresh_key: SecretString,

    /// Refresh-token lifetime in minutes.
    pub refresh_expire_minutes: i64,
}

impl fmt::Debug for JwtSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtSettings")
            .field("algorithm", &self.algorithm)
            .field("access_key", &"[REDACTED]")
            .field("access_expire_minutes", &self.access_expire_minutes)
            .field("refresh_key", &"[REDACTED]")
            .field("refresh_expire_minutes", &self.refresh_expire_minutes)
            .finish()
    }
}

impl JwtSettings {
    /// Create signing settings with default lifetimes.
    ///
    /// # Errors
    ///
    /// - `UnsupportedAlgorithm` if `algorithm` is not an HMAC algorithm
    /// - `SharedSigningKey` if both keys are equal
    pub fn new(
        algorithm: Algorithm,
        access_key: SecretString,
        refresh_key: SecretString,
    ) -> Result<Self, ConfigError> {
        if !matches!(
            algorithm,
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512
        ) {
            return Err(ConfigError::UnsupportedAlgorithm(format!("{algorithm:?}")));
        }

        if access_key.expose_secret() == refresh_key.expose_secret() {
            return Err(ConfigError::SharedSigningKey);
        }

        Ok(Self {
            algorithm,
            access_key,
            access_expire_minutes: DEFAULT_ACCESS_EXPIRE_MINUTES,
            refresh_key,
            refresh_expire_minutes: DEFAULT_REFRESH_EXPIRE_MINUTES,
        })
    }

    /// Set both token lifetimes in minutes.
    ///
    /// # Errors
    ///
    /// Returns `InvalidExpire` if either value is not positive.
    pub fn with_expiry(mut self, access_minutes: i64, refresh_minutes: i64) -> Result<Self, ConfigError> {
        self.access_expire_minutes = positive_minutes("access", access_minutes)?;
        self.refresh_expire_minutes = positive_minutes("refresh", refresh_minutes)?;
        Ok(self)
    }
}

/// Remote role service settings.
#[derive(Debug, Clone)]
pub struct RoleServiceConfig {
    /// Base URL; role lookups go to `{base_url}/api/v1/roles/{subject}`.
    pub base_url: String,

    /// Retry policy for failed lookups.
    pub retry: RetryPolicy,

    /// Per-request HTTP timeout.
    pub request_timeout: Duration,
}

impl Default for RoleServiceConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_ROLES_SERVICE_URL.to_string(),
            retry: RetryPolicy::default(),
            request_timeout: Duration::from_secs(DEFAULT_ROLES_REQUEST_TIMEOUT_SECONDS),
        }
    }
}

impl RoleServiceConfig {
    /// Create settings for the given base URL with default retry behavior.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            ..Self::default()
        }
    }

    /// Replace the retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Replace the per-request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

/// Process-wide authentication configuration.
///
/// Immutable once built. Components receive it as `Arc<AuthConfig>` at
/// construction time.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Time zone used for issuance and expiry checks.
    pub timezone: Tz,

    /// Token signing settings.
    pub jwt: JwtSettings,

    /// Remote role service settings (hard-check mode).
    pub roles: RoleServiceConfig,
}

impl AuthConfig {
    /// Create a configuration in UTC with default role service settings.
    pub fn new(jwt: JwtSettings) -> Self {
        Self {
            timezone: Tz::UTC,
            jwt,
            roles: RoleServiceConfig::default(),
        }
    }

    /// Set the time zone by IANA name.
    ///
    /// # Errors
    ///
    /// Returns `UnknownTimezone` if the name is not a known zone.
    pub fn with_timezone(mut self, name: &str) -> Result<Self, ConfigError> {
        self.timezone = parse_timezone(name)?;
        Ok(self)
    }

    /// Replace the role service settings.
    pub fn with_role_service(mut self, roles: RoleServiceConfig) -> Self {
        self.roles = roles;
        self
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a HashMap (for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let algorithm = match vars.get("JWT_ALGORITHM") {
            Some(name) => Algorithm::from_str(name)
                .map_err(|_| ConfigError::UnsupportedAlgorithm(name.clone()))?,
            None => Algorithm::HS256,
        };

        let access_key = vars
            .get("JWT_ACCESS_KEY")
            .ok_or_else(|| ConfigError::MissingEnvVar("JWT_ACCESS_KEY".to_string()))?;

        let refresh_key = vars
            .get("JWT_REFRESH_KEY")
            .ok_or_else(|| ConfigError::MissingEnvVar("JWT_REFRESH_KEY".to_string()))?;

        let access_expire = parse_minutes(vars, "JWT_ACCESS_EXPIRE", DEFAULT_ACCESS_EXPIRE_MINUTES)?;
        let refresh_expire =
            parse_minutes(vars, "JWT_REFRESH_EXPIRE", DEFAULT_REFRESH_EXPIRE_MINUTES)?;

        let jwt = JwtSettings::new(
            algorithm,
            SecretString::from(access_key.clone()),
            SecretString::from(refresh_key.clone()),
        )?
        .with_expiry(access_expire, refresh_expire)?;

        let timezone = parse_timezone(
            vars.get("AUTH_TIMEZONE")
                .map_or(DEFAULT_TIMEZONE, String::as_str),
        )?;

        let max_attempts = match vars.get("ROLES_MAX_ATTEMPTS") {
            Some(value) => value
                .parse::<u32>()
                .ok()
                .filter(|attempts| *attempts > 0)
                .ok_or_else(|| {
                    ConfigError::InvalidRoleService(format!(
                        "ROLES_MAX_ATTEMPTS must be a positive integer, got {value}"
                    ))
                })?,
            None => DEFAULT_MAX_ATTEMPTS,
        };

        let request_timeout = match vars.get("ROLES_REQUEST_TIMEOUT_SECONDS") {
            Some(value) => value
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .ok_or_else(|| {
                    ConfigError::InvalidRoleService(format!(
                        "ROLES_REQUEST_TIMEOUT_SECONDS must be a positive integer, got {value}"
                    ))
                })?,
            None => Duration::from_secs(DEFAULT_ROLES_REQUEST_TIMEOUT_SECONDS),
        };

        let roles = RoleServiceConfig::new(
            vars.get("ROLES_SERVICE_URL")
                .map_or(DEFAULT_ROLES_SERVICE_URL, String::as_str),
        )
        .with_retry(RetryPolicy::new(max_attempts))
        .with_request_timeout(request_timeout);

        Ok(Self {
            timezone,
            jwt,
            roles,
        })
    }
}

fn parse_timezone(name: &str) -> Result<Tz, ConfigError> {
    name.parse::<Tz>()
        .map_err(|_| ConfigError::UnknownTimezone(name.to_string()))
}

fn parse_minutes(
    vars: &HashMap<String, String>,
    key: &str,
    default: i64,
) -> Result<i64, ConfigError> {
    match vars.get(key) {
        Some(value) => {
            let minutes = value.parse::<i64>().map_err(|e| {
                ConfigError::InvalidExpire(format!("{key} must be a whole number of minutes: {e}"))
            })?;
            positive_minutes(key, minutes)
        }
        None => Ok(default),
    }
}

fn positive_minutes(name: &str, minutes: i64) -> Result<i64, ConfigError> {
    if minutes <= 0 {
        return Err(ConfigError::InvalidExpire(format!(
            "{name} lifetime must be positive, got {minutes}"
        )));
    }
    Ok(minutes)
}
