//! # Supervisor: concurrent start, severity-based escalation, graceful shutdown.
//!
//! The [`Supervisor`] owns the root cancellation token, the event bus and the
//! registered processes. [`Supervisor::start`] runs them all and blocks until the
//! whole system has terminated.
//!
//! ## High-level architecture
//! ```text
//! start():
//!   ShutdownSignals::install(cfg.signals)        (failure ─► RuntimeError::Signal)
//!   subscriber_listener(): Bus ─► SubscriberSet::emit(&Event)
//!
//!   UnitGroup (token = root.child_token())
//!     ├─ for each process p:
//!     │     stop_process(p)   waits for token, p.on_stop(bounded ctx)
//!     │     run_process(p)    p.on_start(token), Major failure ─► Err
//!     └─ signal unit          signal ─► StopHandle::request("signal")
//!
//!   group.wait()
//!     ├─ any Err   ─► token cancelled ─► every stopper runs
//!     └─ all done  ─► first non-cancellation error, or Ok
//!
//!   Bus.publish(SupervisorStopped), drain subscribers, return
//! ```
//!
//! Zero processes is a valid run: it lasts until a signal or [`Supervisor::stop`].
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//! use procvisor::{ProcessError, ProcessFn, Severity, Supervisor, SupervisorConfig};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let cfg = SupervisorConfig {
//!         signals: vec![],
//!         ..SupervisorConfig::default()
//!     };
//!
//!     let worker = ProcessFn::arc(
//!         "worker",
//!         Severity::Major,
//!         |ctx: CancellationToken| async move {
//!             ctx.cancelled().await;
//!             Ok::<_, ProcessError>(())
//!         },
//!         |_ctx: CancellationToken| async { Ok::<_, ProcessError>(()) },
//!     );
//!
//!     let sup = Supervisor::builder(cfg).register(worker).build();
//!     let stop = sup.stop_handle();
//!     tokio::spawn(async move {
//!         tokio::time::sleep(Duration::from_millis(10)).await;
//!         stop.stop();
//!     });
//!
//!     sup.start().await?;
//!     Ok(())
//! }
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::broadcast::{
    self,
    error::{RecvError, TryRecvError},
};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::core::{
    builder::SupervisorBuilder,
    config::SupervisorConfig,
    group::UnitGroup,
    handle::StopHandle,
    runner::{run_process, stop_process},
    shutdown::ShutdownSignals,
};
use crate::error::RuntimeError;
use crate::events::{Bus, Event, EventKind};
use crate::process::ProcessRef;
use crate::subscribers::{Subscribe, SubscriberSet};

/// Runs a fixed set of managed processes under one cancelable lifetime.
pub struct Supervisor {
    cfg: SupervisorConfig,
    processes: Vec<ProcessRef>,
    subscribers: Vec<Arc<dyn Subscribe>>,
    bus: Bus,
    root: CancellationToken,
    handle: StopHandle,
    started: AtomicBool,
}

impl Supervisor {
    /// Returns a builder for a supervisor with the given configuration.
    pub fn builder(cfg: SupervisorConfig) -> SupervisorBuilder {
        SupervisorBuilder::new(cfg)
    }

    pub(crate) fn new_internal(
        cfg: SupervisorConfig,
        processes: Vec<ProcessRef>,
        subscribers: Vec<Arc<dyn Subscribe>>,
    ) -> Self {
        let bus = Bus::new(cfg.bus_capacity);
        let root = CancellationToken::new();
        let handle = StopHandle::new(root.clone(), bus.clone());
        Self {
            cfg,
            processes,
            subscribers,
            bus,
            root,
            handle,
            started: AtomicBool::new(false),
        }
    }

    /// Starts every registered process and blocks until the system terminates.
    ///
    /// Returns `Ok(())` after a clean shutdown (manual stop, signal, or only
    /// cancellation errors). Otherwise returns the first non-cancellation error:
    /// a Major start failure, a stop failure or a stop deadline hit.
    ///
    /// A supervisor runs once; a second call returns [`RuntimeError::AlreadyStarted`].
    pub async fn start(&self) -> Result<(), RuntimeError> {
        if self.started.swap(true, Ordering::AcqRel) {
            return Err(RuntimeError::AlreadyStarted);
        }

        let mut signals = ShutdownSignals::install(&self.cfg.signals)?;
        let (listener_done, listener) = self.subscriber_listener();

        info!(
            processes = self.processes.len(),
            stop_timeout = ?self.cfg.stop_timeout,
            "supervisor starting"
        );

        let mut group = UnitGroup::new(&self.root);
        let token = group.token().clone();
        for process in &self.processes {
            group.spawn(stop_process(
                Arc::clone(process),
                token.clone(),
                self.cfg.stop_timeout,
                self.bus.clone(),
            ));
            group.spawn(run_process(
                Arc::clone(process),
                token.clone(),
                self.bus.clone(),
            ));
        }

        let handle = self.handle.clone();
        group.spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = signals.recv() => handle.request("signal"),
            }
            Ok(())
        });

        let res = match group.wait().await {
            Err(e) if e.is_cancellation() => Ok(()),
            other => other,
        };

        match &res {
            Ok(()) => {
                self.bus.publish(Event::new(EventKind::SupervisorStopped));
                info!("supervisor stopped");
            }
            Err(e) => {
                self.bus
                    .publish(Event::new(EventKind::SupervisorStopped).with_reason(e.to_string()));
                error!(error = %e, label = e.as_label(), "supervisor stopped with error");
            }
        }

        listener_done.cancel();
        let _ = listener.await;
        res
    }

    /// Requests a graceful shutdown. Idempotent; safe before, during and after `start`.
    pub fn stop(&self) {
        self.handle.stop();
    }

    /// Returns a cloneable handle that can stop this supervisor from another task.
    pub fn stop_handle(&self) -> StopHandle {
        self.handle.clone()
    }

    /// Creates a receiver for lifecycle events published after this call.
    pub fn events(&self) -> broadcast::Receiver<Event> {
        self.bus.subscribe()
    }

    /// Number of registered processes.
    pub fn len(&self) -> usize {
        self.processes.len()
    }

    /// True when no process is registered.
    pub fn is_empty(&self) -> bool {
        self.processes.is_empty()
    }

    /// Forwards bus events to the subscriber set until `done` is cancelled,
    /// then drains what is left and waits for the subscriber workers.
    fn subscriber_listener(&self) -> (CancellationToken, JoinHandle<()>) {
        let mut rx = self.bus.subscribe();
        let set = SubscriberSet::new(self.subscribers.clone());
        let done = CancellationToken::new();
        let stop = done.clone();

        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    ev = rx.recv() => match ev {
                        Ok(ev) => set.emit(&ev),
                        Err(RecvError::Lagged(skipped)) => {
                            warn!(skipped, "subscriber listener lagged");
                        }
                        Err(RecvError::Closed) => break,
                    },
                    _ = stop.cancelled() => {
                        loop {
                            match rx.try_recv() {
                                Ok(ev) => set.emit(&ev),
                                Err(TryRecvError::Lagged(_)) => continue,
                                Err(_) => break,
                            }
                        }
                        break;
                    }
                }
            }
            set.shutdown().await;
        });

        (done, handle)
    }
}
