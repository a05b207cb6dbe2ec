//! Configuration and codec fixtures
//!
//! Every fixture uses the keys in [`crate::test_ids`] and a clock frozen at
//! [`TEST_NOW`] unless told otherwise.

use crate::test_ids::{TEST_ACCESS_KEY, TEST_NOW, TEST_REFRESH_KEY};
use chrono_tz::Tz;
use jsonwebtoken::Algorithm;
use jwt_auth::clock::{Clock, FixedClock};
use jwt_auth::config::{AuthConfig, JwtSettings, RoleServiceConfig};
use jwt_auth::retry::RetryPolicy;
use jwt_auth::TokenCodec;
use secrecy::SecretString;
use std::sync::Arc;
use std::time::Duration;

/// HS256 settings with the test keys and default lifetimes.
pub fn test_jwt_settings() -> JwtSettings {
    JwtSettings::new(
        Algorithm::HS256,
        SecretString::from(TEST_ACCESS_KEY),
        SecretString::from(TEST_REFRESH_KEY),
    )
    .expect("test keys are distinct")
}

/// UTC configuration with the test keys.
pub fn test_config() -> Arc<AuthConfig> {
    Arc::new(AuthConfig::new(test_jwt_settings()))
}

/// Configuration pointing the role service at `base_url` with millisecond
/// backoff, so retry tests run fast.
pub fn test_config_with_role_service(base_url: &str, max_attempts: u32) -> Arc<AuthConfig> {
    let roles = RoleServiceConfig::new(base_url)
        .with_retry(fast_retry(max_attempts))
        .with_request_timeout(Duration::from_secs(2));
    Arc::new(AuthConfig::new(test_jwt_settings()).with_role_service(roles))
}

/// Retry policy with 1ms base delay and 5ms cap.
pub fn fast_retry(max_attempts: u32) -> RetryPolicy {
    RetryPolicy::new(max_attempts).with_delays(Duration::from_millis(1), Duration::from_millis(5))
}

/// Clock frozen at `timestamp` in UTC.
pub fn clock_at(timestamp: i64) -> Arc<dyn Clock> {
    Arc::new(FixedClock::at(timestamp, Tz::UTC))
}

/// Codec over [`test_config`] with the clock frozen at [`TEST_NOW`].
pub fn test_codec() -> TokenCodec {
    TokenCodec::with_clock(test_config(), clock_at(TEST_NOW))
}

/// Codec over `config` with the clock frozen at `timestamp`.
pub fn codec_at(config: Arc<AuthConfig>, timestamp: i64) -> TokenCodec {
    TokenCodec::with_clock(config, clock_at(timestamp))
}
