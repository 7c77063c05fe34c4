//! Retry policy with exponential backoff and jitter.
//!
//! Delay before retry `n` (1-indexed):
//!
//! ```text
//! delay = min(base * 2^(n-1), max)
//! delay = delay * (1 + uniform(-jitter, +jitter))
//! ```
//!
//! A rate-limit response carrying `retry-after` replaces the computed delay for
//! that one wait.

use std::time::Duration;

use rand::Rng;

use crate::classify::FailureKind;
use crate::config::RetryConfig;

/// Largest exponent applied to the base delay. Past this the clamp wins anyway.
const MAX_EXPONENT: u32 = 31;

/// Stateless retry policy, constructed once per call site.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    max_retries: u32,
    base_delay: Duration,
    max_delay: Duration,
    jitter_ratio: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(&RetryConfig::default())
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self::new(config)
    }
}

impl RetryPolicy {
    /// Create a policy from configuration.
    pub fn new(config: &RetryConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            base_delay: config.base_delay(),
            max_delay: config.max_delay(),
            jitter_ratio: sanitize_jitter(config.jitter_ratio),
        }
    }

    /// Set the number of retries after the first attempt.
    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the base and max delays.
    #[must_use]
    pub fn with_delays(mut self, base: Duration, max: Duration) -> Self {
        self.base_delay = base;
        self.max_delay = max.max(base);
        self
    }

    /// Set the jitter ratio (clamped to `[0, 1]`, non-finite disables jitter).
    #[must_use]
    pub fn with_jitter_ratio(mut self, ratio: f64) -> Self {
        self.jitter_ratio = sanitize_jitter(ratio);
        self
    }

    /// Retries after the first attempt.
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Total attempts for one logical call, first attempt included.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Upper bound for any single wait.
    pub fn max_delay(&self) -> Duration {
        self.max_delay
    }

    /// Jitter ratio in `[0, 1]`.
    pub fn jitter_ratio(&self) -> f64 {
        self.jitter_ratio
    }

    /// Pre-jitter delay before retry `retry` (1-indexed).
    ///
    /// Non-decreasing in `retry` and never above `max_delay`.
    pub fn backoff_delay(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1).min(MAX_EXPONENT);
        self.base_delay
            .saturating_mul(1u32 << exponent)
            .min(self.max_delay)
    }

    /// Apply jitter to a delay.
    pub fn jittered<R: Rng + ?Sized>(&self, delay: Duration, rng: &mut R) -> Duration {
        if self.jitter_ratio <= 0.0 || delay.is_zero() {
            return delay;
        }
        let factor = 1.0 + rng.gen_range(-self.jitter_ratio..=self.jitter_ratio);
        delay.mul_f64(factor.max(0.0))
    }

    /// Delay to wait before retry `retry` after a failure of `kind`.
    ///
    /// An explicit `retry-after` wins over the computed backoff but is still
    /// capped at `max_delay`.
    pub fn delay_for<R: Rng + ?Sized>(
        &self,
        retry: u32,
        kind: &FailureKind,
        rng: &mut R,
    ) -> Duration {
        match kind.retry_after() {
            Some(retry_after) => retry_after.min(self.max_delay),
            None => self.jittered(self.backoff_delay(retry), rng),
        }
    }
}

/// NaN would survive `clamp` and make the jitter range empty.
fn sanitize_jitter(ratio: f64) -> f64 {
    if ratio.is_finite() {
        ratio.clamp(0.0, 1.0)
    } else {
        0.0
    }
}
