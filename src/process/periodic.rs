//! # Periodic task executor.
//!
//! [`PeriodicTask`] is a [`ManagedProcess`] that runs a handler once on start and
//! then on every interval tick, until it is stopped and drained.
//!
//! ## State machine
//! ```text
//!            begin()             finish()
//!   Idle ──────────────► Running ──────────► Idle
//!    │                      │
//!    │ stop()               │ stop()
//!    ▼                      ▼
//!  Stopped ◄──────────── Draining
//!    (signal raised)      finish()
//! ```
//!
//! ## Rules
//! - At most **one** handler invocation is in flight; a tick that finds one running is skipped.
//! - `stop` with nothing in flight raises the shutdown signal immediately; otherwise the
//!   signal is raised right after the in-flight invocation completes.
//! - The signal is raised at most once; the completion callback runs exactly once, when the
//!   run loop observes the signal.
//! - Errors from tick invocations are logged and ignored; only the first, immediate
//!   invocation fails `on_start`.
//! - `processing_timeout` is advisory and never enforced against the handler.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use futures::FutureExt;
use futures::future::BoxFuture;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::{ConfigError, ProcessError, panic_message};
use crate::process::contract::{ManagedProcess, Severity};

type Handler = Box<dyn Fn() -> BoxFuture<'static, Result<(), ProcessError>> + Send + Sync>;
type Callback = Box<dyn FnOnce() + Send>;

/// Configuration of a [`PeriodicTask`].
#[derive(Clone, Debug)]
pub struct PeriodicConfig {
    /// Delay between two scheduled invocations. Must be non-zero.
    pub interval: Duration,
    /// Expected upper bound of one invocation. Advisory only.
    pub processing_timeout: Option<Duration>,
    /// Severity reported to the supervisor.
    pub severity: Severity,
}

impl Default for PeriodicConfig {
    /// - `interval = 1s`
    /// - `processing_timeout = None`
    /// - `severity = Severity::Major`
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            processing_timeout: None,
            severity: Severity::Major,
        }
    }
}

/// Execution state of a [`PeriodicTask`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TaskState {
    /// No invocation in flight.
    Idle,
    /// An invocation is in flight.
    Running,
    /// Stop was requested while an invocation was in flight.
    Draining,
    /// The shutdown signal has been raised.
    Stopped,
}

struct Inner {
    state: TaskState,
    on_drained: Option<Callback>,
}

/// Runs a handler on a fixed interval under supervision.
///
/// # Example
/// ```rust
/// use std::time::Duration;
/// use procvisor::{ManagedProcess, PeriodicConfig, PeriodicTask, ProcessError};
///
/// let cfg = PeriodicConfig { interval: Duration::from_secs(5), ..PeriodicConfig::default() };
/// let task = PeriodicTask::new(
///     "cleanup",
///     cfg,
///     || async { Ok::<_, ProcessError>(()) },
///     || println!("cleanup drained"),
/// )
/// .unwrap();
/// assert_eq!(task.name(), "cleanup");
/// ```
pub struct PeriodicTask {
    name: String,
    cfg: PeriodicConfig,
    handler: Handler,
    inner: Mutex<Inner>,
    shutdown: CancellationToken,
}

impl std::fmt::Debug for PeriodicTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PeriodicTask")
            .field("name", &self.name)
            .field("cfg", &self.cfg)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl PeriodicTask {
    /// Creates a periodic task.
    ///
    /// `on_drained` is invoked exactly once, when the task finishes draining after `on_stop`.
    ///
    /// Returns [`ConfigError::InvalidInterval`] for a zero interval.
    pub fn new<F, Fut, C>(
        name: impl Into<String>,
        cfg: PeriodicConfig,
        handler: F,
        on_drained: C,
    ) -> Result<Self, ConfigError>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), ProcessError>> + Send + 'static,
        C: FnOnce() + Send + 'static,
    {
        if cfg.interval.is_zero() {
            return Err(ConfigError::InvalidInterval);
        }
        Ok(Self {
            name: name.into(),
            cfg,
            handler: Box::new(move || handler().boxed()),
            inner: Mutex::new(Inner {
                state: TaskState::Idle,
                on_drained: Some(Box::new(on_drained)),
            }),
            shutdown: CancellationToken::new(),
        })
    }

    /// Current execution state.
    pub fn state(&self) -> TaskState {
        self.lock().state
    }

    /// Configured execution interval.
    pub fn interval(&self) -> Duration {
        self.cfg.interval
    }

    /// Advisory processing timeout.
    pub fn processing_timeout(&self) -> Option<Duration> {
        self.cfg.processing_timeout
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Idle → Running. Returns `false` when the invocation must be skipped.
    fn begin(&self) -> bool {
        let mut inner = self.lock();
        match inner.state {
            TaskState::Idle => {
                inner.state = TaskState::Running;
                true
            }
            TaskState::Running | TaskState::Draining | TaskState::Stopped => false,
        }
    }

    /// Running → Idle, or Draining → Stopped (raising the deferred signal).
    fn finish(&self) {
        let mut inner = self.lock();
        match inner.state {
            TaskState::Running => inner.state = TaskState::Idle,
            TaskState::Draining => {
                inner.state = TaskState::Stopped;
                self.shutdown.cancel();
            }
            TaskState::Idle | TaskState::Stopped => {}
        }
    }

    fn request_stop(&self) {
        let mut inner = self.lock();
        match inner.state {
            TaskState::Idle => {
                inner.state = TaskState::Stopped;
                self.shutdown.cancel();
            }
            TaskState::Running => inner.state = TaskState::Draining,
            TaskState::Draining | TaskState::Stopped => {}
        }
    }

    /// Runs the handler once unless another invocation is in flight or shutdown is pending.
    async fn process(&self) -> Result<(), ProcessError> {
        if !self.begin() {
            return Ok(());
        }
        let res = AssertUnwindSafe(async { (self.handler)().await })
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| {
                Err(ProcessError::Panicked {
                    message: panic_message(panic.as_ref()),
                })
            });
        self.finish();
        res
    }

    fn drained(&self) {
        let callback = self.lock().on_drained.take();
        if let Some(callback) = callback {
            debug!(task = %self.name, "periodic task drained");
            callback();
        }
    }
}

#[async_trait]
impl ManagedProcess for PeriodicTask {
    fn name(&self) -> &str {
        &self.name
    }

    fn severity(&self) -> Severity {
        self.cfg.severity
    }

    async fn on_start(&self, _ctx: CancellationToken) -> Result<(), ProcessError> {
        self.process().await?;

        let period = self.cfg.interval;
        let mut ticker = time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => {
                    self.drained();
                    return Ok(());
                }
                _ = ticker.tick() => {
                    if let Err(e) = self.process().await {
                        warn!(task = %self.name, error = %e, "periodic invocation failed");
                    }
                }
            }
        }
    }

    async fn on_stop(&self, _ctx: CancellationToken) -> Result<(), ProcessError> {
        self.request_stop();
        Ok(())
    }
}
