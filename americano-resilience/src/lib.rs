//! americano-resilience - resilient calls to external services
//!
//! Wraps calls to flaky dependencies (the content-generation service in
//! particular) with:
//!
//! - **[`classify`]** - tagged failure kinds, decided once at the boundary
//! - **[`policy`]** - exponential backoff with jitter and `retry-after` support
//! - **[`circuit_breaker`]** - shared per-endpoint breaker with lazy half-open
//! - **[`registry`]** - injectable collection of named breakers
//! - **[`executor`]** - the retry loop, gated by a breaker and cancellable
//!
//! # Example
//!
//! ```ignore
//! let registry = CircuitRegistry::from_config(&config);
//! let caller = ResilientCaller::new(RetryPolicy::new(&config.retry));
//!
//! let breaker = registry.breaker("content-generation");
//! let outcome = caller
//!     .call(&breaker, &cancel, |_attempt| generator.generate(&prompt, &context))
//!     .await?;
//! ```

pub mod circuit_breaker;
pub mod classify;
pub mod config;
mod error;
pub mod executor;
pub mod policy;
pub mod registry;

pub use circuit_breaker::{
    CircuitBreaker, CircuitPermit, CircuitSnapshot, CircuitState, CircuitTransition,
};
pub use classify::{Classify, FailureKind, parse_retry_after};
pub use config::{CircuitBreakerConfig, ResilienceConfig, RetryConfig};
pub use error::{CallError, CircuitOpen};
pub use executor::{CallOutcome, ResilientCaller};
pub use policy::RetryPolicy;
pub use registry::CircuitRegistry;
