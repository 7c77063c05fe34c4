//! Error types for resilient calls.

use std::time::Duration;

use thiserror::Error;

use crate::classify::{Classify, FailureKind};

/// A call was rejected because its circuit is open.
///
/// Distinct from a remote failure: no network call was made.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("circuit '{key}' is open, retry in {}ms", retry_in.as_millis())]
pub struct CircuitOpen {
    /// Circuit that rejected the call.
    pub key: String,
    /// Time until a trial call will be allowed.
    pub retry_in: Duration,
}

/// Failure of one logical call made through [`ResilientCaller`](crate::ResilientCaller).
#[derive(Debug, Error)]
pub enum CallError<E>
where
    E: std::error::Error + 'static,
{
    /// Rejected fast, nothing was attempted.
    #[error(transparent)]
    CircuitOpen(#[from] CircuitOpen),

    /// Failed with a non-retriable error. No further attempts were made.
    #[error("permanent failure after {attempts} attempt(s): {source}")]
    Permanent {
        attempts: u32,
        #[source]
        source: E,
    },

    /// Every attempt failed with a retriable error.
    #[error("retries exhausted after {attempts} attempt(s) ({kind}): {source}")]
    Exhausted {
        attempts: u32,
        kind: FailureKind,
        #[source]
        source: E,
    },

    /// Cancelled by the caller. Neither a success nor a failure for the circuit.
    #[error("call cancelled after {attempts} attempt(s)")]
    Cancelled { attempts: u32 },
}

impl<E> CallError<E>
where
    E: std::error::Error + 'static,
{
    /// Attempts made before giving up.
    pub fn attempts(&self) -> u32 {
        match self {
            Self::CircuitOpen(_) => 0,
            Self::Permanent { attempts, .. }
            | Self::Exhausted { attempts, .. }
            | Self::Cancelled { attempts } => *attempts,
        }
    }

    /// Whether the call was rejected by an open circuit.
    pub fn is_circuit_open(&self) -> bool {
        matches!(self, Self::CircuitOpen(_))
    }

    /// Whether the call was cancelled.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }

    /// The underlying error, if one was observed.
    pub fn source_error(&self) -> Option<&E> {
        match self {
            Self::Permanent { source, .. } | Self::Exhausted { source, .. } => Some(source),
            _ => None,
        }
    }

    /// Classification of the last observed error.
    pub fn failure_kind(&self) -> Option<FailureKind>
    where
        E: Classify,
    {
        match self {
            Self::Permanent { source, .. } => Some(source.failure_kind()),
            Self::Exhausted { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}
