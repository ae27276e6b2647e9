//! Resilience helpers for calls to an external generation service
//!
//! - [`RetryPolicy`]: exponential backoff with optional jitter
//! - [`AbortSignal`]: cooperative cancellation checked between attempts
//! - [`CircuitBreaker`]: fail fast after repeated consecutive failures
//!
//! The two compose: the breaker wraps a single call, the retry policy
//! wraps the breaker.
//!
//! # Example
//!
//! ```rust,ignore
//! use roadmap_resilience::{AbortSignal, CircuitBreaker, RetryPolicy};
//!
//! let breaker = CircuitBreaker::default();
//! let signal = AbortSignal::new();
//! let items = RetryPolicy::default()
//!     .run_until(|| breaker.execute(|| client.generate(&request)), &signal, |e| !e.is_open())
//!     .await?;
//! ```

#![warn(unreachable_pub)]

pub mod abort;
pub mod breaker;
pub mod error;
pub mod retry;

pub use abort::AbortSignal;
pub use breaker::{BreakerOptions, BreakerState, CircuitBreaker};
pub use error::{BreakerError, RetryError};
pub use retry::{BackoffPolicy, RetryOptions, RetryPolicy};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
