use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::events::{Bus, Event, EventKind};

/// Cloneable handle that stops a [`Supervisor`](crate::Supervisor) from anywhere.
///
/// Stopping is idempotent: the first call publishes `ShutdownRequested` and
/// cancels the root token, later calls do nothing.
#[derive(Clone, Debug)]
pub struct StopHandle {
    root: CancellationToken,
    requested: Arc<AtomicBool>,
    bus: Bus,
}

impl StopHandle {
    pub(crate) fn new(root: CancellationToken, bus: Bus) -> Self {
        Self {
            root,
            requested: Arc::new(AtomicBool::new(false)),
            bus,
        }
    }

    /// Requests a graceful shutdown.
    pub fn stop(&self) {
        self.request("manual");
    }

    /// True once a shutdown has been requested (manually or by a signal).
    pub fn is_stopping(&self) -> bool {
        self.requested.load(Ordering::Acquire)
    }

    pub(crate) fn request(&self, reason: &'static str) {
        if !self.requested.swap(true, Ordering::AcqRel) {
            info!(reason, "shutdown requested");
            self.bus
                .publish(Event::new(EventKind::ShutdownRequested).with_reason(reason));
        }
        self.root.cancel();
    }
}
