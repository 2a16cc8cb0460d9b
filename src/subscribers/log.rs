//! # LogWriter: lifecycle events as tracing records
//!
//! Enabled via the `logging` feature. Each [`Event`] becomes one `tracing` record
//! under the `procvisor::events` target; install a subscriber (see
//! [`init_tracing`](crate::init_tracing)) to see them.
//!
//! ## Example output
//! ```text
//! INFO procvisor::events: starting process="api" severity=major
//! WARN procvisor::events: start failed process="poller" severity=minor reason="timeout"
//! INFO procvisor::events: stopping process="api" timeout_ms=60000
//! WARN procvisor::events: stop timeout process="api" timeout_ms=60000
//! ```

use async_trait::async_trait;
use tracing::{error, info, warn};

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Subscriber that forwards events to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let process = e.process.as_deref().unwrap_or("-");
        let reason = e.reason.as_deref().unwrap_or("-");
        let severity = e.severity.map(|s| s.to_string()).unwrap_or_default();

        match e.kind {
            EventKind::ShutdownRequested => {
                info!(target: "procvisor::events", reason, "shutdown requested");
            }
            EventKind::SupervisorStopped => {
                info!(target: "procvisor::events", reason, "supervisor stopped");
            }
            EventKind::ProcessStarting => {
                info!(target: "procvisor::events", process, %severity, "starting");
            }
            EventKind::ProcessExited => {
                info!(target: "procvisor::events", process, "exited");
            }
            EventKind::ProcessFailed => {
                warn!(target: "procvisor::events", process, %severity, reason, "start failed");
            }
            EventKind::FailureEscalated => {
                error!(target: "procvisor::events", process, reason, "failure escalated");
            }
            EventKind::ProcessStopping => {
                info!(target: "procvisor::events", process, timeout_ms = e.timeout_ms, "stopping");
            }
            EventKind::ProcessStopped => {
                info!(target: "procvisor::events", process, "stopped");
            }
            EventKind::ProcessStopFailed => {
                warn!(target: "procvisor::events", process, reason, "stop failed");
            }
            EventKind::StopTimeoutHit => {
                warn!(target: "procvisor::events", process, timeout_ms = e.timeout_ms, "stop timeout");
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
