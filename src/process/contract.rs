//! # The managed-process contract.
//!
//! A [`ManagedProcess`] is any long-running unit (a network server, a poller,
//! a batch job) that the supervisor starts and later asks to stop.
//!
//! ## Contract
//! - `on_start` runs for the whole life of the process. Returning (with or without
//!   an error) does **not** stop the supervisor unless the process is [`Severity::Major`]
//!   and the result is an error.
//! - `on_stop` is called once, after the supervisor begins shutdown. Its token is
//!   cancelled when the supervisor's stop timeout expires. Implementations must make
//!   `on_start` return promptly after `on_stop`; the supervisor never kills a unit.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::ProcessError;

/// How important a process is to the rest of the system.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Severity {
    /// A failing `on_start` shuts down every other process (default).
    #[default]
    Major,
    /// A failing `on_start` is logged; the rest of the system keeps running.
    Minor,
}

impl Severity {
    /// True for [`Severity::Major`].
    pub fn is_critical(self) -> bool {
        matches!(self, Severity::Major)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Major => f.write_str("major"),
            Severity::Minor => f.write_str("minor"),
        }
    }
}

/// # Supervised, cooperatively stoppable unit.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use tokio_util::sync::CancellationToken;
/// use procvisor::{ManagedProcess, ProcessError, Severity};
///
/// struct Listener;
///
/// #[async_trait]
/// impl ManagedProcess for Listener {
///     fn name(&self) -> &str { "listener" }
///     fn severity(&self) -> Severity { Severity::Major }
///
///     async fn on_start(&self, ctx: CancellationToken) -> Result<(), ProcessError> {
///         ctx.cancelled().await;
///         Ok(())
///     }
///
///     async fn on_stop(&self, _ctx: CancellationToken) -> Result<(), ProcessError> {
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait ManagedProcess: Send + Sync + 'static {
    /// Stable, human-readable name.
    fn name(&self) -> &str;

    /// Severity used for failure escalation.
    fn severity(&self) -> Severity;

    /// Runs the process. `ctx` is cancelled when the supervisor begins shutdown.
    async fn on_start(&self, ctx: CancellationToken) -> Result<(), ProcessError>;

    /// Asks the process to stop. `ctx` is cancelled once the stop deadline passes.
    async fn on_stop(&self, ctx: CancellationToken) -> Result<(), ProcessError>;
}

/// Shared handle to a managed process.
pub type ProcessRef = Arc<dyn ManagedProcess>;
