//! Circuit breaker for calls to an external dependency.
//!
//! One breaker guards one logical endpoint and is shared by every concurrent
//! call to it. State lives behind a mutex; each transition is applied under a
//! single lock acquisition.
//!
//! ## State Machine
//!
//! ```text
//!              failures >= threshold
//!   ┌────────┐ ─────────────────────► ┌──────┐
//!   │ Closed │                        │ Open │ ◄──────────┐
//!   └────────┘ ◄───┐                  └──┬───┘            │
//!                  │ trial succeeds      │ reset timeout   │ trial fails
//!                  │                     ▼ (next call)     │
//!                  │                 ┌──────────┐          │
//!                  └──────────────── │ HalfOpen │ ─────────┘
//!                                    └──────────┘
//! ```
//!
//! `Open -> HalfOpen` is lazy: it happens on the first call after the reset
//! timeout, not on a timer. In `HalfOpen` exactly one trial call is let
//! through at a time.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::config::CircuitBreakerConfig;
use crate::error::CircuitOpen;

/// State of a circuit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    /// Calls pass through.
    #[default]
    Closed,
    /// Calls are rejected without being attempted.
    Open,
    /// One trial call is allowed to test recovery.
    HalfOpen,
}

impl std::fmt::Display for CircuitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Closed => write!(f, "closed"),
            Self::Open => write!(f, "open"),
            Self::HalfOpen => write!(f, "half_open"),
        }
    }
}

/// Transition emitted when a circuit changes state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CircuitTransition {
    /// Circuit opened, calls will be rejected.
    Opened {
        key: String,
        consecutive_failures: u32,
    },
    /// Reset timeout elapsed, a trial call is being let through.
    HalfOpened { key: String },
    /// Trial call succeeded.
    Closed { key: String },
    /// Trial call failed, reset timer restarted.
    Reopened { key: String },
}

impl CircuitTransition {
    /// State the circuit is in after this transition.
    pub fn to_state(&self) -> CircuitState {
        match self {
            Self::Opened { .. } | Self::Reopened { .. } => CircuitState::Open,
            Self::HalfOpened { .. } => CircuitState::HalfOpen,
            Self::Closed { .. } => CircuitState::Closed,
        }
    }
}

/// Point-in-time view of a circuit, for status endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircuitSnapshot {
    pub key: String,
    pub state: CircuitState,
    pub consecutive_failures: u32,
    pub failure_threshold: u32,
    /// How long the circuit has been open.
    pub open_for_ms: Option<u64>,
    /// Time until a trial call will be allowed.
    pub retry_in_ms: Option<u64>,
    /// Calls rejected without being attempted since creation.
    pub rejected_calls: u64,
}

#[derive(Debug)]
struct BreakerState {
    state: CircuitState,
    consecutive_failures: u32,
    opened_at: Option<Instant>,
    trial_in_flight: bool,
    rejected_calls: u64,
}

impl BreakerState {
    fn new() -> Self {
        Self {
            state: CircuitState::Closed,
            consecutive_failures: 0,
            opened_at: None,
            trial_in_flight: false,
            rejected_calls: 0,
        }
    }
}

/// Circuit breaker for one logical endpoint.
pub struct CircuitBreaker {
    key: String,
    config: CircuitBreakerConfig,
    inner: Mutex<BreakerState>,
}

impl CircuitBreaker {
    /// Create a closed circuit.
    pub fn new(key: impl Into<String>, config: CircuitBreakerConfig) -> Self {
        Self {
            key: key.into(),
            config,
            inner: Mutex::new(BreakerState::new()),
        }
    }

    /// Key of this circuit.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Configuration of this circuit.
    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }

    /// Check if the breaker gates calls.
    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Current state, without applying the lazy `Open -> HalfOpen` transition.
    pub fn state(&self) -> CircuitState {
        self.lock().state
    }

    /// Current consecutive failure count.
    pub fn consecutive_failures(&self) -> u32 {
        self.lock().consecutive_failures
    }

    /// Ask permission to make a call.
    pub fn try_acquire(&self) -> Result<CircuitPermit<'_>, CircuitOpen> {
        self.try_acquire_at(Instant::now())
    }

    /// Ask permission to make a call at `now`.
    pub fn try_acquire_at(&self, now: Instant) -> Result<CircuitPermit<'_>, CircuitOpen> {
        if !self.config.enabled {
            return Ok(CircuitPermit::new(self, false));
        }

        let reset_timeout = self.config.reset_timeout();
        let mut inner = self.lock();

        if inner.state == CircuitState::Open {
            let elapsed = inner
                .opened_at
                .map(|at| now.saturating_duration_since(at))
                .unwrap_or(reset_timeout);

            if elapsed < reset_timeout {
                inner.rejected_calls += 1;
                return Err(CircuitOpen {
                    key: self.key.clone(),
                    retry_in: reset_timeout - elapsed,
                });
            }

            inner.state = CircuitState::HalfOpen;
            inner.trial_in_flight = false;
            log_transition(&CircuitTransition::HalfOpened {
                key: self.key.clone(),
            });
        }

        match inner.state {
            CircuitState::Closed => Ok(CircuitPermit::new(self, false)),
            CircuitState::HalfOpen if !inner.trial_in_flight => {
                inner.trial_in_flight = true;
                Ok(CircuitPermit::new(self, true))
            }
            _ => {
                inner.rejected_calls += 1;
                Err(CircuitOpen {
                    key: self.key.clone(),
                    retry_in: Duration::ZERO,
                })
            }
        }
    }

    /// Snapshot of the circuit state.
    pub fn snapshot(&self) -> CircuitSnapshot {
        self.snapshot_at(Instant::now())
    }

    /// Snapshot of the circuit state at `now`.
    pub fn snapshot_at(&self, now: Instant) -> CircuitSnapshot {
        let inner = self.lock();
        let open_for = match inner.state {
            CircuitState::Open => inner.opened_at.map(|at| now.saturating_duration_since(at)),
            _ => None,
        };
        CircuitSnapshot {
            key: self.key.clone(),
            state: inner.state,
            consecutive_failures: inner.consecutive_failures,
            failure_threshold: self.config.failure_threshold,
            open_for_ms: open_for.map(|d| d.as_millis() as u64),
            retry_in_ms: open_for
                .map(|d| self.config.reset_timeout().saturating_sub(d).as_millis() as u64),
            rejected_calls: inner.rejected_calls,
        }
    }

    fn on_success(&self, trial: bool) -> Option<CircuitTransition> {
        let mut inner = self.lock();
        match inner.state {
            CircuitState::Closed => {
                inner.consecutive_failures = 0;
                None
            }
            CircuitState::HalfOpen if trial => {
                inner.state = CircuitState::Closed;
                inner.consecutive_failures = 0;
                inner.opened_at = None;
                inner.trial_in_flight = false;
                Some(self.emit(CircuitTransition::Closed {
                    key: self.key.clone(),
                }))
            }
            // Outcome of a call admitted before the circuit opened
            _ => None,
        }
    }

    fn on_failure(&self, trial: bool, now: Instant) -> Option<CircuitTransition> {
        let mut inner = self.lock();
        match inner.state {
            CircuitState::Closed => {
                inner.consecutive_failures = inner.consecutive_failures.saturating_add(1);
                if inner.consecutive_failures < self.config.failure_threshold.max(1) {
                    return None;
                }
                inner.state = CircuitState::Open;
                inner.opened_at = Some(now);
                Some(self.emit(CircuitTransition::Opened {
                    key: self.key.clone(),
                    consecutive_failures: inner.consecutive_failures,
                }))
            }
            CircuitState::HalfOpen if trial => {
                inner.state = CircuitState::Open;
                inner.opened_at = Some(now);
                inner.trial_in_flight = false;
                inner.consecutive_failures = inner.consecutive_failures.saturating_add(1);
                Some(self.emit(CircuitTransition::Reopened {
                    key: self.key.clone(),
                }))
            }
            _ => None,
        }
    }

    fn release_trial(&self) {
        let mut inner = self.lock();
        if inner.state == CircuitState::HalfOpen {
            inner.trial_in_flight = false;
        }
    }

    fn emit(&self, transition: CircuitTransition) -> CircuitTransition {
        log_transition(&transition);
        transition
    }

    fn lock(&self) -> MutexGuard<'_, BreakerState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for CircuitBreaker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.lock();
        f.debug_struct("CircuitBreaker")
            .field("key", &self.key)
            .field("enabled", &self.config.enabled)
            .field("state", &inner.state)
            .field("consecutive_failures", &inner.consecutive_failures)
            .field("failure_threshold", &self.config.failure_threshold)
            .field("reset_timeout_ms", &self.config.reset_timeout_ms)
            .finish()
    }
}

fn log_transition(transition: &CircuitTransition) {
    match transition {
        CircuitTransition::Opened {
            key,
            consecutive_failures,
        } => tracing::warn!(key = %key, consecutive_failures, "Circuit opened"),
        CircuitTransition::Reopened { key } => {
            tracing::warn!(key = %key, "Trial call failed, circuit reopened")
        }
        CircuitTransition::HalfOpened { key } => {
            tracing::info!(key = %key, "Reset timeout elapsed, circuit half-open")
        }
        CircuitTransition::Closed { key } => {
            tracing::info!(key = %key, "Trial call succeeded, circuit closed")
        }
    }
}

/// Permission to make one call through a circuit.
///
/// Report the outcome with [`record_success`](Self::record_success) or
/// [`record_failure`](Self::record_failure). Dropping the permit without
/// reporting (e.g. on cancellation) counts as neither and frees the trial slot.
#[must_use = "report the call outcome on the permit"]
pub struct CircuitPermit<'a> {
    breaker: &'a CircuitBreaker,
    trial: bool,
    settled: bool,
}

impl<'a> CircuitPermit<'a> {
    fn new(breaker: &'a CircuitBreaker, trial: bool) -> Self {
        Self {
            breaker,
            trial,
            settled: false,
        }
    }

    /// Whether this permit is the `HalfOpen` trial call.
    pub fn is_trial(&self) -> bool {
        self.trial
    }

    /// Report a successful call.
    pub fn record_success(mut self) -> Option<CircuitTransition> {
        self.settled = true;
        if !self.breaker.is_enabled() {
            return None;
        }
        self.breaker.on_success(self.trial)
    }

    /// Report a failed call.
    pub fn record_failure(self) -> Option<CircuitTransition> {
        self.record_failure_at(Instant::now())
    }

    /// Report a failed call at `now`.
    pub fn record_failure_at(mut self, now: Instant) -> Option<CircuitTransition> {
        self.settled = true;
        if !self.breaker.is_enabled() {
            return None;
        }
        self.breaker.on_failure(self.trial, now)
    }
}

impl Drop for CircuitPermit<'_> {
    fn drop(&mut self) {
        if !self.settled && self.trial {
            self.breaker.release_trial();
        }
    }
}

impl std::fmt::Debug for CircuitPermit<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CircuitPermit")
            .field("key", &self.breaker.key)
            .field("trial", &self.trial)
            .finish()
    }
}
