//! Retry policy with exponential backoff and full jitter.
//!
//! Used by the remote role resolver. Each attempt that fails with a
//! retryable error sleeps for a random delay in `[0, min(max, base * 2^n)]`
//! before the next one, up to `max_attempts` attempts in total.

use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Default number of attempts (first try included).
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Default base delay for the first retry.
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);

/// Default cap on a single backoff delay.
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(30);

/// Outcome of a single attempt that did not succeed.
#[derive(Debug)]
pub enum Attempt<E> {
    /// Worth trying again (transport error, non-200 status).
    Retry(E),
    /// Give up immediately.
    Abort(E),
}

/// Exponential backoff retry policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one. Never zero.
    pub max_attempts: u32,

    /// Backoff ceiling for the first retry.
    pub base_delay: Duration,

    /// Upper bound for any single backoff ceiling.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: DEFAULT_BASE_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
        }
    }
}

impl RetryPolicy {
    /// Create a policy with the given attempt count and default delays.
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            ..Self::default()
        }
    }

    /// Set the base and maximum backoff delays.
    pub fn with_delays(mut self, base_delay: Duration, max_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self.max_delay = max_delay.max(base_delay);
        self
    }

    /// Backoff ceiling after the given failed attempt (0-based).
    pub fn ceiling(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.min(16));
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }

    /// Randomized delay after the given failed attempt (full jitter).
    pub fn delay<R: Rng + ?Sized>(&self, attempt: u32, rng: &mut R) -> Duration {
        let ceiling = self.ceiling(attempt);
        if ceiling.is_zero() {
            return Duration::ZERO;
        }
        #[allow(clippy::cast_possible_truncation)]
        let ceiling_ms = ceiling.as_millis().min(u128::from(u64::MAX)) as u64;
        Duration::from_millis(rng.gen_range(0..=ceiling_ms))
    }

    /// Run `operation` until it succeeds, aborts, or attempts run out.
    ///
    /// The error of the last attempt is returned when all attempts fail.
    pub async fn run<T, E, F, Fut>(&self, mut operation: F) -> Result<T, E>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, Attempt<E>>>,
        E: std::fmt::Display,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            match operation(attempt).await {
                Ok(value) => return Ok(value),
                Err(Attempt::Abort(e)) => {
                    debug!(target: "jwt_auth.retry", error = %e, attempt, "Attempt aborted, not retrying");
                    return Err(e);
                }
                Err(Attempt::Retry(e)) => {
                    if attempt + 1 >= max_attempts {
                        warn!(
                            target: "jwt_auth.retry",
                            error = %e,
                            attempts = max_attempts,
                            "Giving up after exhausting retries"
                        );
                        return Err(e);
                    }

                    let delay = self.delay(attempt, &mut rand::thread_rng());
                    debug!(
                        target: "jwt_auth.retry",
                        error = %e,
                        attempt,
                        backoff_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        "Attempt failed, will retry"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}
