//! # Supervisor configuration.
//!
//! Provides [`SupervisorConfig`] settings for one supervisor run.
//!
//! ## Sentinel values
//! - `stop_timeout = 0s` → every `on_stop` context is already expired (processes get no time)
//! - `signals = []` → no OS signal listener; only manual [`Supervisor::stop`](crate::Supervisor::stop)

use std::time::Duration;

/// OS signals that trigger a graceful shutdown.
///
/// On non-Unix platforms every variant maps to Ctrl-C.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ShutdownSignal {
    /// `SIGINT` (Ctrl-C in a terminal).
    Interrupt,
    /// `SIGTERM` (default kill signal, used by systemd/Kubernetes).
    Terminate,
    /// `SIGQUIT`.
    Quit,
    /// `SIGHUP`.
    Hangup,
}

/// Configuration for one supervisor run.
///
/// ## Field semantics
/// - `stop_timeout`: deadline of the context handed to each `on_stop`
/// - `signals`: signals that trigger [`Supervisor::stop`](crate::Supervisor::stop)
/// - `bus_capacity`: event bus ring buffer size (min 1; clamped by Bus)
#[derive(Clone, Debug)]
pub struct SupervisorConfig {
    /// Bound of the context passed to every `on_stop` call.
    ///
    /// This bounds the *context* only; a process that ignores it keeps the run alive.
    pub stop_timeout: Duration,

    /// Signals that start a graceful shutdown.
    pub signals: Vec<ShutdownSignal>,

    /// Capacity of the event bus broadcast channel.
    pub bus_capacity: usize,
}

impl Default for SupervisorConfig {
    /// Default configuration:
    ///
    /// - `stop_timeout = 60s`
    /// - `signals = [Terminate, Quit, Interrupt]`
    /// - `bus_capacity = 1024`
    fn default() -> Self {
        Self {
            stop_timeout: Duration::from_secs(60),
            signals: vec![
                ShutdownSignal::Terminate,
                ShutdownSignal::Quit,
                ShutdownSignal::Interrupt,
            ],
            bus_capacity: 1024,
        }
    }
}
