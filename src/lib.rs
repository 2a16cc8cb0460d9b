//! # procvisor
//!
//! **Procvisor** is a toolkit of runtime primitives for resilient, long-running
//! services: a supervisor for background processes, a periodic task executor,
//! a circuit breaker and a filter-based middleware chain resolver.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌────────────────┐   ┌────────────────┐   ┌────────────────┐
//!     │ ManagedProcess │   │ ManagedProcess │   │  PeriodicTask  │
//!     │ (Major: api)   │   │ (Minor: cache) │   │ (Major: sweep) │
//!     └───────┬────────┘   └───────┬────────┘   └───────┬────────┘
//!             ▼                    ▼                    ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Supervisor                                                       │
//! │  - root CancellationToken (stop / StopHandle / OS signals)        │
//! │  - fan-in group: runner + stopper per process, signal unit        │
//! │  - Bus (broadcast lifecycle events)                               │
//! └────────────────────────────────┬──────────────────────────────────┘
//!                                  ▼
//!                       ┌──────────────────────┐
//!                       │ subscriber listener  │
//!                       └──────────┬───────────┘
//!                                  ▼
//!                            SubscriberSet
//!                        ┌─────────┼─────────┐
//!                        ▼         ▼         ▼
//!                     worker1   worker2   workerN
//! ```
//!
//! ### Lifecycle
//! ```text
//! start()
//!   ├─► every process: on_start(token)      (concurrently)
//!   │       ├─ Ok / Canceled      ─► exited
//!   │       ├─ Err, Minor         ─► logged, system keeps running
//!   │       └─ Err, Major / panic ─► token cancelled
//!   │
//!   ├─► token cancelled (stop, signal or Major failure)
//!   │       └─ every process: on_stop(ctx bounded by stop_timeout)
//!   │
//!   └─► all units done ─► Ok, or the first non-cancellation error
//! ```
//!
//! ## Features
//! | Area               | Description                                              | Key types / traits                          |
//! |--------------------|----------------------------------------------------------|---------------------------------------------|
//! | **Supervision**    | Start/stop a fixed set of processes with escalation.     | [`Supervisor`], [`ManagedProcess`]          |
//! | **Periodic work**  | Fixed-interval handler with cooperative draining.        | [`PeriodicTask`], [`PeriodicConfig`]        |
//! | **Fast-fail**      | Circuit breaker for arbitrary sync/async actions.        | [`CircuitBreaker`], [`BreakerConfig`]       |
//! | **Middleware**     | Filter-based selection and onion composition.            | [`MiddlewareChainResolver`], [`Middleware`] |
//! | **Execution**      | Retry with backoff, run with a deadline.                 | [`run_with_retry`], [`run_with_timeout`]    |
//! | **Subscriber API** | Hook into lifecycle events.                              | [`Subscribe`], [`Event`]                    |
//! | **Errors**         | Typed errors with stable labels.                         | [`RuntimeError`], [`ProcessError`]          |
//!
//! ## Optional features
//! - `logging`: exports [`init_tracing`] and the [`LogWriter`] subscriber.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//! use procvisor::{PeriodicConfig, PeriodicTask, ProcessError, Severity, Supervisor, SupervisorConfig};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let cfg = SupervisorConfig {
//!         stop_timeout: Duration::from_secs(5),
//!         signals: vec![],
//!         ..SupervisorConfig::default()
//!     };
//!
//!     let sweep = PeriodicTask::new(
//!         "sweep",
//!         PeriodicConfig {
//!             interval: Duration::from_millis(5),
//!             ..PeriodicConfig::default()
//!         },
//!         || async { Ok::<_, ProcessError>(()) },
//!         || println!("sweep drained"),
//!     )?;
//!
//!     let sup = Supervisor::builder(cfg).register(Arc::new(sweep)).build();
//!     let stop = sup.stop_handle();
//!     tokio::spawn(async move {
//!         tokio::time::sleep(Duration::from_millis(20)).await;
//!         stop.stop();
//!     });
//!
//!     sup.start().await?;
//!     Ok(())
//! }
//! ```
mod breaker;
mod core;
mod error;
mod events;
mod execution;
mod middleware;
mod process;
mod subscribers;

// ---- Public re-exports ----

pub use breaker::{BreakerConfig, BreakerSettings, CircuitBreaker, CircuitState};
pub use core::{ShutdownSignal, StopHandle, Supervisor, SupervisorBuilder, SupervisorConfig};
pub use error::{BreakerError, ConfigError, ExecutionError, ProcessError, RuntimeError};
pub use events::{Event, EventKind};
pub use execution::{BackoffPolicy, JitterPolicy, run_with_retry, run_with_timeout};
pub use middleware::{
    Handler, Middleware, MiddlewareChainResolver, MiddlewareRef, compose, handler_fn,
    middleware_fn,
};
pub use process::{
    ManagedProcess, PeriodicConfig, PeriodicTask, ProcessFn, ProcessRef, Severity, TaskState,
};
pub use subscribers::{Subscribe, SubscriberSet};

// Optional: tracing setup and a built-in logger subscriber.
// Enable with: `--features logging`
#[cfg(feature = "logging")]
mod observability;
#[cfg(feature = "logging")]
pub use observability::init_tracing;
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
