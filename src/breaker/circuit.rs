//! # Circuit breaker.
//!
//! ```text
//!            failure_count > failure_limit
//!   Closed ─────────────────────────────────► Open
//!     ▲                                        │ reset_timeout elapsed
//!     │ reset()                                ▼ (checked by the next call)
//!     └──────────────────────────────────── HalfOpen ── failure ──► Open
//! ```
//!
//! - The action runs **outside** the lock; concurrent callers may push the count
//!   past the limit before the `Open` state becomes visible to all of them.
//! - Failures are counted for the whole lifetime of the breaker. A success in
//!   `HalfOpen` keeps the breaker there; call [`CircuitBreaker::reset`] to close it.
//!
//! ## Example
//! ```rust
//! use procvisor::{BreakerError, BreakerSettings, CircuitBreaker, CircuitState};
//!
//! let cb = CircuitBreaker::from_settings(BreakerSettings {
//!     failure_limit: 1,
//!     ..BreakerSettings::default()
//! });
//!
//! for _ in 0..2 {
//!     let _ = cb.proceed(|| Err::<(), _>("down"));
//! }
//! assert_eq!(cb.state(), CircuitState::Open);
//! assert!(matches!(cb.proceed(|| Ok::<_, &str>(1)), Err(BreakerError::Open)));
//! ```

use std::fmt;
use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, warn};

use crate::breaker::config::{BreakerConfig, BreakerSettings};
use crate::error::{BreakerError, ConfigError};

/// State of a [`CircuitBreaker`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CircuitState {
    /// Calls go through.
    Closed,
    /// The open period is over; calls go through again.
    HalfOpen,
    /// Calls fail fast with [`BreakerError::Open`].
    Open,
}

type Hook = Box<dyn Fn() + Send + Sync>;

struct Inner {
    state: CircuitState,
    failure_count: u64,
    last_failure: Option<Instant>,
}

/// Fast-fail wrapper that stops calling an action after repeated failures.
pub struct CircuitBreaker {
    inner: Mutex<Inner>,
    failure_limit: u64,
    reset_timeout: Duration,
    on_success: Option<Hook>,
    on_failure: Option<Hook>,
}

impl CircuitBreaker {
    /// Builds a breaker from raw configuration, failing on non-numeric values.
    pub fn new(cfg: &BreakerConfig) -> Result<Self, ConfigError> {
        Ok(Self::from_settings(cfg.parse()?))
    }

    /// Builds a breaker from `CB_MAX_FAILURES_THRESHOLD` and `CB_RESET_TIMEOUT`.
    pub fn from_env() -> Result<Self, ConfigError> {
        use envconfig::Envconfig;
        Self::new(&BreakerConfig::init_from_env()?)
    }

    /// Builds a breaker from parsed settings.
    pub fn from_settings(settings: BreakerSettings) -> Self {
        Self {
            inner: Mutex::new(Inner {
                state: CircuitState::Closed,
                failure_count: 0,
                last_failure: None,
            }),
            failure_limit: settings.failure_limit,
            reset_timeout: settings.reset_timeout,
            on_success: None,
            on_failure: None,
        }
    }

    /// Sets a hook called after every successful action.
    pub fn on_success(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_success = Some(Box::new(hook));
        self
    }

    /// Sets a hook called after every failed action.
    pub fn on_failure(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_failure = Some(Box::new(hook));
        self
    }

    /// Runs `action` unless the breaker is open.
    ///
    /// # Errors
    /// - [`BreakerError::Open`] when the breaker is open; `action` is not called.
    /// - [`BreakerError::Action`] with the action's own error.
    pub fn proceed<T, E, F>(&self, action: F) -> Result<T, BreakerError<E>>
    where
        F: FnOnce() -> Result<T, E>,
    {
        if !self.admit() {
            return Err(BreakerError::Open);
        }
        self.record(action())
    }

    /// Async form of [`CircuitBreaker::proceed`]. The lock is never held across the await.
    pub async fn proceed_async<T, E, F, Fut>(&self, action: F) -> Result<T, BreakerError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if !self.admit() {
            return Err(BreakerError::Open);
        }
        self.record(action().await)
    }

    /// Current state.
    pub fn state(&self) -> CircuitState {
        self.lock().state
    }

    /// Failures recorded since construction or the last [`CircuitBreaker::reset`].
    pub fn failure_count(&self) -> u64 {
        self.lock().failure_count
    }

    /// Closes the breaker and clears the failure count.
    pub fn reset(&self) {
        let mut inner = self.lock();
        inner.state = CircuitState::Closed;
        inner.failure_count = 0;
        inner.last_failure = None;
        debug!("circuit breaker reset");
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Decides whether a call may run. An expired open period is turned into
    /// `HalfOpen` and re-checked once.
    fn admit(&self) -> bool {
        let mut inner = self.lock();
        let mut probed = false;
        loop {
            match inner.state {
                CircuitState::Closed | CircuitState::HalfOpen => return true,
                CircuitState::Open if !probed && self.open_period_over(&inner) => {
                    inner.state = CircuitState::HalfOpen;
                    probed = true;
                    debug!(failures = inner.failure_count, "circuit breaker half-open");
                }
                CircuitState::Open => return false,
            }
        }
    }

    fn open_period_over(&self, inner: &Inner) -> bool {
        inner
            .last_failure
            .is_none_or(|at| at.elapsed() > self.reset_timeout)
    }

    fn record<T, E>(&self, res: Result<T, E>) -> Result<T, BreakerError<E>> {
        match res {
            Ok(v) => {
                if let Some(hook) = &self.on_success {
                    hook();
                }
                Ok(v)
            }
            Err(e) => {
                {
                    let mut inner = self.lock();
                    inner.failure_count = inner.failure_count.saturating_add(1);
                    inner.last_failure = Some(Instant::now());
                    if inner.failure_count > self.failure_limit && inner.state != CircuitState::Open
                    {
                        inner.state = CircuitState::Open;
                        warn!(
                            failures = inner.failure_count,
                            limit = self.failure_limit,
                            "circuit breaker opened"
                        );
                    }
                }
                if let Some(hook) = &self.on_failure {
                    hook();
                }
                Err(BreakerError::Action(e))
            }
        }
    }
}

impl fmt::Debug for CircuitBreaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.lock();
        f.debug_struct("CircuitBreaker")
            .field("state", &inner.state)
            .field("failure_count", &inner.failure_count)
            .field("failure_limit", &self.failure_limit)
            .field("reset_timeout", &self.reset_timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn breaker(limit: u64, reset_secs: u64) -> CircuitBreaker {
        CircuitBreaker::from_settings(BreakerSettings {
            failure_limit: limit,
            reset_timeout: Duration::from_secs(reset_secs),
        })
    }

    #[test]
    fn config_errors_surface_at_construction() {
        let cfg = BreakerConfig {
            max_failures_threshold: "three".to_string(),
            ..BreakerConfig::default()
        };
        assert!(CircuitBreaker::new(&cfg).is_err());
        assert!(CircuitBreaker::new(&BreakerConfig::default()).is_ok());
    }

    #[test]
    fn opens_only_past_the_limit() {
        let cb = breaker(3, 60);
        for _ in 0..3 {
            assert!(cb.proceed(|| Err::<(), _>("down")).is_err());
        }
        assert_eq!(cb.state(), CircuitState::Closed);

        let _ = cb.proceed(|| Err::<(), _>("down"));
        assert_eq!(cb.state(), CircuitState::Open);
        assert_eq!(cb.failure_count(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn open_breaker_probes_once_after_reset_timeout() {
        let cb = breaker(3, 60);
        for _ in 0..4 {
            let _ = cb.proceed(|| Err::<(), _>("down"));
        }

        let calls = AtomicUsize::new(0);
        let call = || {
            calls.fetch_add(1, Ordering::SeqCst);
            Err::<(), _>("still down")
        };

        assert_eq!(cb.proceed(call), Err(BreakerError::Open));
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        tokio::time::advance(Duration::from_secs(61)).await;
        assert_eq!(cb.proceed(call), Err(BreakerError::Action("still down")));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cb.state(), CircuitState::Open);

        assert!(cb.proceed(call).unwrap_err().is_open());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn stays_open_at_exactly_the_reset_timeout() {
        let cb = breaker(0, 60);
        let _ = cb.proceed(|| Err::<(), _>("down"));

        let calls = AtomicUsize::new(0);
        let call = || {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok::<_, &str>(())
        };

        tokio::time::advance(Duration::from_secs(60)).await;
        assert_eq!(cb.proceed(call), Err(BreakerError::Open));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(cb.state(), CircuitState::Open);

        tokio::time::advance(Duration::from_millis(1)).await;
        assert_eq!(cb.proceed(call), Ok(()));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cb.state(), CircuitState::HalfOpen);
    }

    #[tokio::test(start_paused = true)]
    async fn success_in_half_open_keeps_half_open() {
        let cb = breaker(0, 1);
        let _ = cb.proceed(|| Err::<(), _>("down"));
        assert_eq!(cb.state(), CircuitState::Open);

        tokio::time::advance(Duration::from_millis(1001)).await;
        assert_eq!(cb.proceed(|| Ok::<_, ()>(7)), Ok(7));
        assert_eq!(cb.state(), CircuitState::HalfOpen);

        cb.reset();
        assert_eq!(cb.state(), CircuitState::Closed);
        assert_eq!(cb.failure_count(), 0);
    }

    #[test]
    fn hooks_fire_per_outcome() {
        let ok = Arc::new(AtomicUsize::new(0));
        let failed = Arc::new(AtomicUsize::new(0));
        let cb = breaker(10, 60)
            .on_success({
                let ok = Arc::clone(&ok);
                move || {
                    ok.fetch_add(1, Ordering::SeqCst);
                }
            })
            .on_failure({
                let failed = Arc::clone(&failed);
                move || {
                    failed.fetch_add(1, Ordering::SeqCst);
                }
            });

        let _ = cb.proceed(|| Ok::<_, ()>(()));
        let _ = cb.proceed(|| Err::<(), _>(()));
        let _ = cb.proceed(|| Ok::<_, ()>(()));
        assert_eq!(ok.load(Ordering::SeqCst), 2);
        assert_eq!(failed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn async_actions_are_guarded() {
        let cb = breaker(0, 60);
        let res = cb.proceed_async(|| async { Err::<(), _>("timeout") }).await;
        assert_eq!(res, Err(BreakerError::Action("timeout")));

        let res = cb.proceed_async(|| async { Ok::<_, &str>(()) }).await;
        assert!(res.unwrap_err().is_open());
    }
}
