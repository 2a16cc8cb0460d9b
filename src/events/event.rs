//! # Lifecycle events emitted by the supervisor.
//!
//! [`EventKind`] classifies events in two groups:
//! - **Process events**: one managed process moving through start/stop
//! - **Supervisor events**: shutdown requested, run finished
//!
//! [`Event`] carries the metadata (timestamp, process name, severity, reason, timeout).
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//! Events from distinct processes have no defined relative order beyond `seq`.
//!
//! ## Example
//! ```rust
//! use procvisor::{Event, EventKind, Severity};
//!
//! let ev = Event::new(EventKind::ProcessFailed)
//!     .with_process("api")
//!     .with_severity(Severity::Major)
//!     .with_reason("bind: address in use");
//!
//! assert_eq!(ev.kind, EventKind::ProcessFailed);
//! assert_eq!(ev.process.as_deref(), Some("api"));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

use crate::process::Severity;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Supervisor events ===
    /// Shutdown requested (OS signal or manual stop).
    ///
    /// Sets: `reason` ("signal" or "manual").
    ShutdownRequested,

    /// Every unit completed; the run is over.
    ///
    /// Sets: `reason` when the run ended with an error.
    SupervisorStopped,

    // === Process start path ===
    /// `on_start` is about to be called.
    ///
    /// Sets: `process`, `severity`.
    ProcessStarting,

    /// `on_start` returned `Ok` (or observed cancellation).
    ///
    /// Sets: `process`.
    ProcessExited,

    /// `on_start` returned an error or panicked.
    ///
    /// Sets: `process`, `severity`, `reason`.
    ProcessFailed,

    /// A Major failure is shutting the whole system down.
    ///
    /// Sets: `process`, `reason`.
    FailureEscalated,

    // === Process stop path ===
    /// `on_stop` is about to be called with a bounded context.
    ///
    /// Sets: `process`, `timeout_ms`.
    ProcessStopping,

    /// `on_stop` returned `Ok`.
    ///
    /// Sets: `process`.
    ProcessStopped,

    /// `on_stop` returned an error or panicked.
    ///
    /// Sets: `process`, `reason`.
    ProcessStopFailed,

    /// The stop context expired before `on_stop` returned.
    ///
    /// Sets: `process`, `timeout_ms`.
    StopTimeoutHit,
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,
    /// Name of the process, if applicable.
    pub process: Option<Arc<str>>,
    /// Severity of the process, if applicable.
    pub severity: Option<Severity>,
    /// Human-readable reason (errors, shutdown trigger).
    pub reason: Option<Arc<str>>,
    /// Stop timeout in milliseconds (compact).
    pub timeout_ms: Option<u32>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            process: None,
            severity: None,
            reason: None,
            timeout_ms: None,
        }
    }

    /// Attaches a process name.
    #[inline]
    pub fn with_process(mut self, name: impl Into<Arc<str>>) -> Self {
        self.process = Some(name.into());
        self
    }

    /// Attaches a process severity.
    #[inline]
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = Some(severity);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches a timeout duration (stored as milliseconds).
    #[inline]
    pub fn with_timeout(mut self, d: Duration) -> Self {
        let ms = d.as_millis().min(u128::from(u32::MAX)) as u32;
        self.timeout_ms = Some(ms);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_is_monotonic() {
        let a = Event::new(EventKind::ProcessStarting);
        let b = Event::new(EventKind::ProcessStopping);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn timeout_is_clamped_to_u32_millis() {
        let ev = Event::new(EventKind::StopTimeoutHit).with_timeout(Duration::from_secs(u64::MAX));
        assert_eq!(ev.timeout_ms, Some(u32::MAX));

        let ev = Event::new(EventKind::ProcessStopping).with_timeout(Duration::from_secs(60));
        assert_eq!(ev.timeout_ms, Some(60_000));
    }
}
