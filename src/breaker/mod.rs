//! Fast-fail wrapper for arbitrary actions.
//!
//! ## Contents
//! - [`BreakerConfig`] environment-style configuration (raw strings), parsed into [`BreakerSettings`]
//! - [`CircuitBreaker`] the breaker itself, with sync and async entry points
//! - [`CircuitState`] Closed, HalfOpen or Open

mod circuit;
mod config;

pub use circuit::{CircuitBreaker, CircuitState};
pub use config::{BreakerConfig, BreakerSettings};
