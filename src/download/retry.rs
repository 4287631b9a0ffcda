//! Retry logic with exponential backoff for failed fetch attempts.
//!
//! Every transport error and every non-success status is retried until the
//! attempt ceiling is reached. The delay after attempt `n` (0-indexed) is
//! `base * 2^n`, with no jitter:
//!
//! ```text
//! attempt 0 fails -> wait base
//! attempt 1 fails -> wait base * 2
//! attempt 2 fails -> wait base * 4
//! ...
//! ```
//!
//! No wait follows the final attempt; the error is returned immediately.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use comic_crawler::download::{FetchError, RetryDecision, RetryPolicy};
//!
//! let policy = RetryPolicy::default();
//! let error = FetchError::http_status("https://example.com/1.jpg", 503);
//!
//! match policy.should_retry(&error, 0) {
//!     RetryDecision::Retry { delay, attempt } => {
//!         assert_eq!(delay, Duration::from_secs(2));
//!         assert_eq!(attempt, 1);
//!     }
//!     RetryDecision::DoNotRetry { reason } => panic!("unexpected: {reason}"),
//! }
//! ```

use std::time::Duration;

use tracing::{debug, instrument};

use super::FetchError;
use super::constants::{DEFAULT_BACKOFF_BASE, DEFAULT_MAX_ATTEMPTS};

/// Decision on whether to retry a failed fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    /// Retry after the specified delay.
    Retry {
        /// How long to wait before the next attempt.
        delay: Duration,
        /// Index of the next attempt (0-indexed).
        attempt: u32,
    },

    /// Give up and surface the last error.
    DoNotRetry {
        /// Human-readable reason why retry is not attempted.
        reason: String,
    },
}

/// Attempt ceiling and backoff base for fetches.
///
/// Defaults: 5 attempts, 2 second base (waits of 2s, 4s, 8s, 16s).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of attempts, including the initial one.
    max_attempts: u32,

    /// Delay after the first failed attempt.
    base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: DEFAULT_BACKOFF_BASE,
        }
    }
}

impl RetryPolicy {
    /// Creates a policy with a custom ceiling and base delay.
    ///
    /// `max_attempts` is clamped to at least 1.
    #[must_use]
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    /// Returns the maximum number of attempts configured.
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Returns the backoff base.
    #[must_use]
    pub fn base_delay(&self) -> Duration {
        self.base_delay
    }

    /// Delay to wait after attempt `attempt` (0-indexed) failed.
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }

    /// Sum of every wait a fully failing fetch goes through.
    #[must_use]
    pub fn total_backoff(&self) -> Duration {
        (0..self.max_attempts.saturating_sub(1))
            .map(|attempt| self.delay_for(attempt))
            .sum()
    }

    /// Decides what happens after attempt `attempt` (0-indexed) failed with `error`.
    #[instrument(level = "debug", skip(self, error), fields(max_attempts = self.max_attempts))]
    pub fn should_retry(&self, error: &FetchError, attempt: u32) -> RetryDecision {
        if !error.is_retryable() {
            return RetryDecision::DoNotRetry {
                reason: "permanent failure - retry would not help".to_string(),
            };
        }

        let next_attempt = attempt.saturating_add(1);
        if next_attempt >= self.max_attempts {
            debug!(attempt, "max attempts reached");
            return RetryDecision::DoNotRetry {
                reason: format!("max attempts ({}) exhausted", self.max_attempts),
            };
        }

        let delay = self.delay_for(attempt);
        debug!(
            attempt,
            next_attempt,
            delay_ms = delay.as_millis(),
            "will retry"
        );

        RetryDecision::Retry {
            delay,
            attempt: next_attempt,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn transient() -> FetchError {
        FetchError::http_status("https://example.com/a.jpg", 503)
    }

    #[test]
    fn test_retry_policy_default_values() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts(), 5);
        assert_eq!(policy.base_delay(), Duration::from_secs(2));
    }

    #[test]
    fn test_retry_policy_max_attempts_minimum_is_one() {
        let policy = RetryPolicy::new(0, DEFAULT_BACKOFF_BASE);
        assert_eq!(policy.max_attempts(), 1);
    }

    #[test]
    fn test_delay_doubles_from_base() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(0), Duration::from_secs(2));
        assert_eq!(policy.delay_for(1), Duration::from_secs(4));
        assert_eq!(policy.delay_for(2), Duration::from_secs(8));
        assert_eq!(policy.delay_for(3), Duration::from_secs(16));
    }

    #[test]
    fn test_delay_saturates_instead_of_overflowing() {
        let policy = RetryPolicy::new(5, Duration::from_secs(2));
        assert_eq!(policy.delay_for(64), Duration::from_secs(2).saturating_mul(u32::MAX));
    }

    #[test]
    fn test_total_backoff_sums_waits_between_attempts() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.total_backoff(), Duration::from_secs(2 + 4 + 8 + 16));

        let single = RetryPolicy::new(1, DEFAULT_BACKOFF_BASE);
        assert_eq!(single.total_backoff(), Duration::ZERO);
    }

    #[test]
    fn test_should_retry_until_ceiling_with_increasing_delays() {
        let policy = RetryPolicy::default();
        let mut previous = Duration::ZERO;

        for attempt in 0..4 {
            match policy.should_retry(&transient(), attempt) {
                RetryDecision::Retry {
                    delay,
                    attempt: next,
                } => {
                    assert!(delay > previous, "delays must strictly increase");
                    assert_eq!(next, attempt + 1);
                    previous = delay;
                }
                RetryDecision::DoNotRetry { reason } => {
                    panic!("attempt {attempt} should retry, got: {reason}")
                }
            }
        }

        let decision = policy.should_retry(&transient(), 4);
        assert!(
            matches!(decision, RetryDecision::DoNotRetry { ref reason } if reason.contains("exhausted")),
            "fifth failure must stop: {decision:?}"
        );
    }

    #[test]
    fn test_should_retry_invalid_url_does_not_retry() {
        let policy = RetryPolicy::default();
        let decision = policy.should_retry(&FetchError::invalid_url("::"), 0);
        assert!(matches!(decision, RetryDecision::DoNotRetry { .. }));
    }

    #[test]
    fn test_should_retry_client_errors_are_retried_too() {
        let policy = RetryPolicy::default();
        let decision = policy.should_retry(&FetchError::http_status("u", 404), 0);
        assert!(matches!(decision, RetryDecision::Retry { .. }));
    }
}
