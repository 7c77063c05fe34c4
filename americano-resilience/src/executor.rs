//! Retry loop gated by a circuit breaker.
//!
//! ```text
//! ResilientCaller::call(breaker, cancel, op)
//!     │
//!     ├─ Circuit open? → Err(CircuitOpen), nothing attempted
//!     │
//!     ├─ op(attempt)
//!     │     ├─ Ok → record success → Ok(CallOutcome)
//!     │     ├─ Permanent → record failure → Err(Permanent)
//!     │     └─ Retriable
//!     │          ├─ attempts left → sleep(backoff + jitter) → retry
//!     │          └─ exhausted → record failure → Err(Exhausted)
//!     │
//!     └─ Cancelled at any await → Err(Cancelled), circuit untouched
//! ```
//!
//! The breaker sees one outcome per logical call, not one per attempt.

use std::future::Future;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::circuit_breaker::CircuitBreaker;
use crate::classify::Classify;
use crate::error::CallError;
use crate::policy::RetryPolicy;

/// Successful result of a logical call.
#[derive(Debug, Clone, PartialEq)]
pub struct CallOutcome<T> {
    /// Value returned by the last attempt.
    pub value: T,
    /// Attempts made, including the successful one.
    pub attempts: u32,
}

/// Runs calls with retries behind a circuit breaker.
#[derive(Debug, Clone, Default)]
pub struct ResilientCaller {
    policy: RetryPolicy,
}

impl ResilientCaller {
    /// Create a caller with the given retry policy.
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    /// Retry policy in use.
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Make one logical call.
    ///
    /// `op` receives the 1-indexed attempt number. Waits between attempts do
    /// not block the runtime and stop as soon as `cancel` fires.
    pub async fn call<T, E, F, Fut>(
        &self,
        breaker: &CircuitBreaker,
        cancel: &CancellationToken,
        mut op: F,
    ) -> Result<CallOutcome<T>, CallError<E>>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Classify + std::error::Error + 'static,
    {
        if cancel.is_cancelled() {
            return Err(CallError::Cancelled { attempts: 0 });
        }

        let permit = breaker.try_acquire()?;
        let max_attempts = self.policy.max_attempts();
        let mut attempt = 0;

        loop {
            attempt += 1;

            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!(key = breaker.key(), attempt, "Call cancelled mid-attempt");
                    return Err(CallError::Cancelled { attempts: attempt });
                }
                result = op(attempt) => result,
            };

            let error = match result {
                Ok(value) => {
                    let _ = permit.record_success();
                    if attempt > 1 {
                        debug!(key = breaker.key(), attempt, "Call succeeded after retry");
                    }
                    return Ok(CallOutcome {
                        value,
                        attempts: attempt,
                    });
                }
                Err(error) => error,
            };

            let kind = error.failure_kind();

            if !kind.is_retriable() {
                warn!(
                    key = breaker.key(),
                    attempt,
                    error = %error,
                    "Permanent failure, not retrying"
                );
                let _ = permit.record_failure();
                return Err(CallError::Permanent {
                    attempts: attempt,
                    source: error,
                });
            }

            if attempt >= max_attempts {
                warn!(
                    key = breaker.key(),
                    attempt,
                    kind = %kind,
                    error = %error,
                    "Retries exhausted"
                );
                let _ = permit.record_failure();
                return Err(CallError::Exhausted {
                    attempts: attempt,
                    kind,
                    source: error,
                });
            }

            let delay = self
                .policy
                .delay_for(attempt, &kind, &mut rand::thread_rng());

            warn!(
                key = breaker.key(),
                attempt,
                max_attempts,
                kind = %kind,
                delay_ms = delay.as_millis() as u64,
                error = %error,
                "Call failed, will retry after backoff"
            );

            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!(key = breaker.key(), attempt, "Call cancelled during backoff");
                    return Err(CallError::Cancelled { attempts: attempt });
                }
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }
}
