//! # Closure-backed process (`ProcessFn`)
//!
//! [`ProcessFn`] wraps two closures, one per lifecycle hook. Each call creates a
//! fresh future; share state between the hooks explicitly through `Arc<...>`.
//!
//! ## Example
//! ```rust
//! use tokio_util::sync::CancellationToken;
//! use procvisor::{ManagedProcess, ProcessError, ProcessFn, ProcessRef, Severity};
//!
//! let p: ProcessRef = ProcessFn::arc(
//!     "poller",
//!     Severity::Minor,
//!     |ctx: CancellationToken| async move {
//!         ctx.cancelled().await;
//!         Ok::<_, ProcessError>(())
//!     },
//!     |_ctx: CancellationToken| async { Ok::<_, ProcessError>(()) },
//! );
//!
//! assert_eq!(p.name(), "poller");
//! ```

use std::borrow::Cow;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::ProcessError;
use crate::process::contract::{ManagedProcess, Severity};

/// Function-backed managed process.
#[derive(Debug)]
pub struct ProcessFn<S, T> {
    name: Cow<'static, str>,
    severity: Severity,
    start: S,
    stop: T,
}

impl<S, T> ProcessFn<S, T> {
    /// Creates a new function-backed process.
    ///
    /// Prefer [`ProcessFn::arc`] when you immediately need a [`ProcessRef`](crate::ProcessRef).
    pub fn new(name: impl Into<Cow<'static, str>>, severity: Severity, start: S, stop: T) -> Self {
        Self {
            name: name.into(),
            severity,
            start,
            stop,
        }
    }

    /// Creates the process and returns it as a shared handle.
    pub fn arc(
        name: impl Into<Cow<'static, str>>,
        severity: Severity,
        start: S,
        stop: T,
    ) -> Arc<Self> {
        Arc::new(Self::new(name, severity, start, stop))
    }
}

#[async_trait]
impl<S, SFut, T, TFut> ManagedProcess for ProcessFn<S, T>
where
    S: Fn(CancellationToken) -> SFut + Send + Sync + 'static,
    SFut: Future<Output = Result<(), ProcessError>> + Send + 'static,
    T: Fn(CancellationToken) -> TFut + Send + Sync + 'static,
    TFut: Future<Output = Result<(), ProcessError>> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn severity(&self) -> Severity {
        self.severity
    }

    async fn on_start(&self, ctx: CancellationToken) -> Result<(), ProcessError> {
        (self.start)(ctx).await
    }

    async fn on_stop(&self, ctx: CancellationToken) -> Result<(), ProcessError> {
        (self.stop)(ctx).await
    }
}
