//! Execution helpers: bounded retries and deadlines for one-off work.
//!
//! ## Contents
//! - [`run_with_retry`] repeats a fallible async action with backoff between failures
//! - [`run_with_timeout`] races work against a deadline and a parent token
//! - [`BackoffPolicy`], [`JitterPolicy`] delay schedule for retries
//!
//! ## Defaults
//! - `BackoffPolicy::default()` → first=100ms, factor=4.0, max=30s, jitter=None.

mod backoff;
mod retry;
mod timeout;

pub use backoff::{BackoffPolicy, JitterPolicy};
pub use retry::run_with_retry;
pub use timeout::run_with_timeout;
