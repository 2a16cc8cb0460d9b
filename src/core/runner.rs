//! # Per-process units of work.
//!
//! For every registered process the supervisor spawns two units into its fan-in group:
//!
//! ```text
//! run_process(p, ctx)                     stop_process(p, ctx, timeout)
//!   publish ProcessStarting                 ctx.cancelled().await
//!   p.on_start(ctx)                         publish ProcessStopping
//!     ├─ Ok / Canceled ─► ProcessExited     p.on_stop(stop_ctx) bounded by timeout
//!     ├─ Err, Minor    ─► ProcessFailed       ├─ Ok        ─► ProcessStopped
//!     │                   (swallowed)         ├─ Err       ─► ProcessStopFailed, Err
//!     ├─ Err, Major    ─► ProcessFailed       └─ deadline  ─► StopTimeoutHit,
//!     │                   FailureEscalated, Err                 Err(StopTimeout)
//!     └─ panic         ─► escalated regardless of severity
//! ```
//!
//! ## Rules
//! - Panics are caught at the unit boundary and returned as [`ProcessError::Panicked`].
//! - `stop_ctx` is a fresh token cancelled when the deadline passes; the `on_stop` future
//!   is dropped at that point, the process itself is never forcibly terminated.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::time::Duration;

use futures::FutureExt;
use tokio::time;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::error::{ProcessError, RuntimeError, panic_message};
use crate::events::{Bus, Event, EventKind};
use crate::process::ProcessRef;

/// Runner unit: calls `on_start` and applies severity-based escalation.
pub(crate) async fn run_process(
    process: ProcessRef,
    ctx: CancellationToken,
    bus: Bus,
) -> Result<(), RuntimeError> {
    let name = process.name().to_string();
    let severity = process.severity();

    bus.publish(
        Event::new(EventKind::ProcessStarting)
            .with_process(name.as_str())
            .with_severity(severity),
    );
    info!(process = %name, %severity, "starting process");

    let (res, panicked) = match guarded(process.on_start(ctx)).await {
        Err(e @ ProcessError::Panicked { .. }) => (Err(e), true),
        other => (other, false),
    };

    match res {
        Ok(()) | Err(ProcessError::Canceled) => {
            bus.publish(Event::new(EventKind::ProcessExited).with_process(name.as_str()));
            info!(process = %name, "process exited");
            Ok(())
        }
        Err(e) => {
            bus.publish(
                Event::new(EventKind::ProcessFailed)
                    .with_process(name.as_str())
                    .with_severity(severity)
                    .with_reason(e.to_string()),
            );

            if !severity.is_critical() && !panicked {
                warn!(process = %name, %severity, error = %e, "process failed; continuing");
                return Ok(());
            }

            bus.publish(
                Event::new(EventKind::FailureEscalated)
                    .with_process(name.as_str())
                    .with_reason(e.to_string()),
            );
            warn!(process = %name, %severity, error = %e, "process failed; shutting down");
            Err(RuntimeError::StartFailed {
                name,
                severity,
                source: e,
            })
        }
    }
}

/// Stopper unit: waits for shutdown, then calls `on_stop` with a bounded context.
pub(crate) async fn stop_process(
    process: ProcessRef,
    ctx: CancellationToken,
    timeout: Duration,
    bus: Bus,
) -> Result<(), RuntimeError> {
    ctx.cancelled().await;

    let name = process.name().to_string();
    bus.publish(
        Event::new(EventKind::ProcessStopping)
            .with_process(name.as_str())
            .with_timeout(timeout),
    );
    info!(process = %name, ?timeout, "stopping process");

    let stop_ctx = CancellationToken::new();
    let res = match time::timeout(timeout, guarded(process.on_stop(stop_ctx.clone()))).await {
        Ok(res) => res,
        Err(_elapsed) => {
            stop_ctx.cancel();
            bus.publish(
                Event::new(EventKind::StopTimeoutHit)
                    .with_process(name.as_str())
                    .with_timeout(timeout),
            );
            Err(ProcessError::StopTimeout { timeout })
        }
    };

    match res {
        Ok(()) => {
            bus.publish(Event::new(EventKind::ProcessStopped).with_process(name.as_str()));
            info!(process = %name, "process stopped");
            Ok(())
        }
        Err(e) => {
            bus.publish(
                Event::new(EventKind::ProcessStopFailed)
                    .with_process(name.as_str())
                    .with_reason(e.to_string()),
            );
            warn!(process = %name, error = %e, "process failed to stop");
            Err(RuntimeError::StopFailed { name, source: e })
        }
    }
}

/// Awaits `fut`, turning a panic into [`ProcessError::Panicked`].
async fn guarded<F>(fut: F) -> Result<(), ProcessError>
where
    F: Future<Output = Result<(), ProcessError>>,
{
    AssertUnwindSafe(fut).catch_unwind().await.unwrap_or_else(|panic| {
        Err(ProcessError::Panicked {
            message: panic_message(panic.as_ref()),
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::{ProcessFn, Severity};

    async fn noop(_ctx: CancellationToken) -> Result<(), ProcessError> {
        Ok(())
    }

    async fn bind_failed(_ctx: CancellationToken) -> Result<(), ProcessError> {
        Err(ProcessError::fail("bind failed"))
    }

    async fn explode(_ctx: CancellationToken) -> Result<(), ProcessError> {
        panic!("bug")
    }

    async fn hang(_ctx: CancellationToken) -> Result<(), ProcessError> {
        std::future::pending::<()>().await;
        Ok(())
    }

    async fn quit_on_cancel(ctx: CancellationToken) -> Result<(), ProcessError> {
        ctx.cancelled().await;
        Err(ProcessError::Canceled)
    }

    async fn canceled(_ctx: CancellationToken) -> Result<(), ProcessError> {
        Err(ProcessError::Canceled)
    }

    #[tokio::test]
    async fn minor_failure_is_swallowed() {
        let p: ProcessRef = ProcessFn::arc("failing", Severity::Minor, bind_failed, noop);
        let res = run_process(p, CancellationToken::new(), Bus::new(8)).await;
        assert!(res.is_ok());
    }

    #[tokio::test]
    async fn major_failure_is_escalated() {
        let bus = Bus::new(8);
        let mut rx = bus.subscribe();
        let p: ProcessRef = ProcessFn::arc("failing", Severity::Major, bind_failed, noop);
        let err = run_process(p, CancellationToken::new(), bus)
            .await
            .unwrap_err();
        assert_eq!(err.as_label(), "runtime_start_failed");

        let kinds: Vec<_> = std::iter::from_fn(|| rx.try_recv().ok().map(|e| e.kind)).collect();
        assert_eq!(
            kinds,
            vec![
                EventKind::ProcessStarting,
                EventKind::ProcessFailed,
                EventKind::FailureEscalated
            ]
        );
    }

    #[tokio::test]
    async fn minor_panic_is_still_escalated() {
        let p: ProcessRef = ProcessFn::arc("panicky", Severity::Minor, explode, noop);
        let err = run_process(p, CancellationToken::new(), Bus::new(8))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RuntimeError::StartFailed { source: ProcessError::Panicked { .. }, .. }
        ));
    }

    #[tokio::test]
    async fn canceled_start_is_clean_exit() {
        let p: ProcessRef = ProcessFn::arc("cancelled", Severity::Major, canceled, noop);
        assert!(run_process(p, CancellationToken::new(), Bus::new(8)).await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn stop_deadline_is_reported_as_stop_error() {
        let p: ProcessRef = ProcessFn::arc("stubborn", Severity::Major, noop, hang);
        let ctx = CancellationToken::new();
        ctx.cancel();

        let err = stop_process(p, ctx, Duration::from_secs(2), Bus::new(8))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RuntimeError::StopFailed { source: ProcessError::StopTimeout { timeout }, .. }
                if timeout == Duration::from_secs(2)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn stop_context_is_cancelled_at_deadline() {
        let p: ProcessRef = ProcessFn::arc("cooperative", Severity::Major, noop, quit_on_cancel);
        let ctx = CancellationToken::new();
        ctx.cancel();

        // The deadline drops the future before it can observe the cancellation.
        let err = stop_process(p, ctx, Duration::from_millis(10), Bus::new(8))
            .await
            .unwrap_err();
        assert!(!err.is_cancellation());
    }

    #[tokio::test]
    async fn stopper_waits_for_shutdown() {
        let p: ProcessRef = ProcessFn::arc("idle", Severity::Major, noop, noop);
        let ctx = CancellationToken::new();
        let unit = tokio::spawn(stop_process(p, ctx.clone(), Duration::from_secs(1), Bus::new(8)));

        tokio::task::yield_now().await;
        assert!(!unit.is_finished());
        ctx.cancel();
        assert!(unit.await.unwrap().is_ok());
    }
}
