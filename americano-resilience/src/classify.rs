//! Failure classification.
//!
//! Raw errors from an external service are turned into a [`FailureKind`] at the
//! boundary where they are first observed. The retry loop only ever switches on
//! the kind, never on status codes or error strings.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Classification of a failed call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum FailureKind {
    /// The service asked us to slow down, optionally saying for how long.
    RateLimited {
        #[serde(default, with = "optional_millis")]
        retry_after: Option<Duration>,
    },
    /// Timeouts, connection resets, 5xx gateway errors.
    Transient,
    /// Malformed responses and client errors. Retrying will not help.
    Permanent,
    /// Could not be classified.
    Unknown,
}

impl FailureKind {
    /// Rate limited without an explicit wait.
    pub const fn rate_limited() -> Self {
        Self::RateLimited { retry_after: None }
    }

    /// Classify an HTTP status code.
    ///
    /// | Status | Kind |
    /// |--------|------|
    /// | 429 | `RateLimited` |
    /// | 408, 500, 502, 503, 504 | `Transient` |
    /// | other 4xx | `Permanent` |
    /// | anything else | `Unknown` |
    pub fn from_status(status: u16, retry_after: Option<Duration>) -> Self {
        match status {
            429 => Self::RateLimited { retry_after },
            408 | 500 | 502 | 503 | 504 => Self::Transient,
            400..=499 => Self::Permanent,
            _ => Self::Unknown,
        }
    }

    /// Whether another attempt is worth making.
    ///
    /// `Unknown` is retried: it consumes budget but never loops forever.
    pub fn is_retriable(&self) -> bool {
        !matches!(self, Self::Permanent)
    }

    /// Explicit wait requested by the service, if any.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { retry_after } => *retry_after,
            _ => None,
        }
    }

    /// Short label for logs and API responses.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RateLimited { .. } => "rate_limited",
            Self::Transient => "transient",
            Self::Permanent => "permanent",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can be classified for retry decisions.
pub trait Classify {
    /// Classify this error.
    fn failure_kind(&self) -> FailureKind;
}

/// Parse a `Retry-After` header given in whole seconds.
///
/// HTTP-date values are not supported and yield `None`.
pub fn parse_retry_after(value: &str) -> Option<Duration> {
    value.trim().parse::<u64>().ok().map(Duration::from_secs)
}

mod optional_millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => s.serialize_some(&(d.as_millis() as u64)),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
        Ok(Option::<u64>::deserialize(d)?.map(Duration::from_millis))
    }
}
