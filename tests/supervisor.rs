use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use procvisor::{
    Event, EventKind, ManagedProcess, PeriodicConfig, PeriodicTask, ProcessError, RuntimeError,
    Severity, ShutdownSignal, Subscribe, Supervisor, SupervisorConfig,
};

type StopLog = Arc<Mutex<Vec<&'static str>>>;

/// Either fails `on_start` after a delay or runs until cancelled; records every `on_stop`.
struct Probe {
    name: &'static str,
    severity: Severity,
    fail_after: Option<Duration>,
    stop_delay: Option<Duration>,
    stops: StopLog,
}

impl Probe {
    fn running(name: &'static str, severity: Severity, stops: &StopLog) -> Arc<Self> {
        Arc::new(Self {
            name,
            severity,
            fail_after: None,
            stop_delay: None,
            stops: Arc::clone(stops),
        })
    }

    fn failing(name: &'static str, severity: Severity, after: Duration, stops: &StopLog) -> Arc<Self> {
        Arc::new(Self {
            name,
            severity,
            fail_after: Some(after),
            stop_delay: None,
            stops: Arc::clone(stops),
        })
    }
}

#[async_trait]
impl ManagedProcess for Probe {
    fn name(&self) -> &str {
        self.name
    }

    fn severity(&self) -> Severity {
        self.severity
    }

    async fn on_start(&self, ctx: CancellationToken) -> Result<(), ProcessError> {
        match self.fail_after {
            Some(after) => {
                tokio::time::sleep(after).await;
                Err(ProcessError::fail(format!("{} crashed", self.name)))
            }
            None => {
                ctx.cancelled().await;
                Ok(())
            }
        }
    }

    async fn on_stop(&self, _ctx: CancellationToken) -> Result<(), ProcessError> {
        if let Some(delay) = self.stop_delay {
            tokio::time::sleep(delay).await;
        }
        self.stops.lock().unwrap().push(self.name);
        Ok(())
    }
}

fn config(stop_timeout: Duration) -> SupervisorConfig {
    SupervisorConfig {
        stop_timeout,
        signals: vec![],
        ..SupervisorConfig::default()
    }
}

fn sorted(stops: &StopLog) -> Vec<&'static str> {
    let mut names = stops.lock().unwrap().clone();
    names.sort_unstable();
    names
}

#[tokio::test]
async fn major_failure_stops_every_process() -> anyhow::Result<()> {
    let stops = StopLog::default();
    let sup = Supervisor::builder(config(Duration::from_secs(1)))
        .register(Probe::failing("api", Severity::Major, Duration::from_millis(10), &stops))
        .register(Probe::running("worker", Severity::Major, &stops))
        .register(Probe::running("cache", Severity::Minor, &stops))
        .build();

    let res = tokio::time::timeout(Duration::from_secs(2), sup.start()).await?;
    let err = res.unwrap_err();
    assert!(!err.is_cancellation());
    assert!(matches!(err, RuntimeError::StartFailed { ref name, severity: Severity::Major, .. } if name == "api"));
    assert_eq!(sorted(&stops), ["api", "cache", "worker"]);
    Ok(())
}

#[tokio::test]
async fn minor_failures_end_cleanly_after_stop() -> anyhow::Result<()> {
    let stops = StopLog::default();
    let sup = Supervisor::builder(config(Duration::from_secs(1)))
        .register(Probe::failing("poller", Severity::Minor, Duration::ZERO, &stops))
        .register(Probe::running("api", Severity::Major, &stops))
        .build();

    let stop = sup.stop_handle();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        stop.stop();
    });

    sup.start().await?;
    assert_eq!(sorted(&stops), ["api", "poller"]);
    Ok(())
}

#[tokio::test]
async fn zero_processes_run_until_stopped() -> anyhow::Result<()> {
    let sup = Arc::new(Supervisor::builder(config(Duration::from_secs(1))).build());
    assert!(sup.is_empty());

    let run = tokio::spawn({
        let sup = Arc::clone(&sup);
        async move { sup.start().await }
    });
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(!run.is_finished());

    sup.stop();
    run.await??;
    Ok(())
}

#[tokio::test]
async fn slow_stop_is_reported_as_stop_timeout() {
    let stops = StopLog::default();
    let slow = Arc::new(Probe {
        name: "slow",
        severity: Severity::Major,
        fail_after: None,
        stop_delay: Some(Duration::from_secs(5)),
        stops: Arc::clone(&stops),
    });
    let sup = Supervisor::builder(config(Duration::from_millis(20)))
        .register(slow)
        .build();
    sup.stop();

    let err = sup.start().await.unwrap_err();
    assert!(matches!(
        err,
        RuntimeError::StopFailed { source: ProcessError::StopTimeout { .. }, .. }
    ));
    assert!(stops.lock().unwrap().is_empty());
}

#[derive(Default)]
struct Kinds(Mutex<Vec<EventKind>>);

#[async_trait]
impl Subscribe for Kinds {
    async fn on_event(&self, ev: &Event) {
        self.0.lock().unwrap().push(ev.kind);
    }
}

#[tokio::test]
async fn periodic_task_drains_under_supervision() -> anyhow::Result<()> {
    let runs = Arc::new(AtomicUsize::new(0));
    let drained = Arc::new(AtomicUsize::new(0));

    let task = PeriodicTask::new(
        "sweep",
        PeriodicConfig {
            interval: Duration::from_millis(5),
            ..PeriodicConfig::default()
        },
        {
            let runs = Arc::clone(&runs);
            move || {
                runs.fetch_add(1, Ordering::SeqCst);
                async { Ok::<(), ProcessError>(()) }
            }
        },
        {
            let drained = Arc::clone(&drained);
            move || {
                drained.fetch_add(1, Ordering::SeqCst);
            }
        },
    )?;

    let kinds = Arc::new(Kinds::default());
    let sup = Supervisor::builder(config(Duration::from_secs(1)))
        .register(Arc::new(task))
        .with_subscribers(vec![kinds.clone() as Arc<dyn Subscribe>])
        .build();

    let stop = sup.stop_handle();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(40)).await;
        stop.stop();
    });
    sup.start().await?;

    assert!(runs.load(Ordering::SeqCst) >= 2);
    assert_eq!(drained.load(Ordering::SeqCst), 1);

    let kinds = kinds.0.lock().unwrap().clone();
    for expected in [
        EventKind::ProcessStarting,
        EventKind::ShutdownRequested,
        EventKind::ProcessStopping,
        EventKind::ProcessStopped,
        EventKind::ProcessExited,
        EventKind::SupervisorStopped,
    ] {
        assert!(kinds.contains(&expected), "missing {expected:?} in {kinds:?}");
    }
    Ok(())
}

#[cfg(unix)]
#[tokio::test]
async fn hangup_signal_shuts_down_cleanly() -> anyhow::Result<()> {
    let stops = StopLog::default();
    let sup = Arc::new(
        Supervisor::builder(SupervisorConfig {
            stop_timeout: Duration::from_secs(1),
            signals: vec![ShutdownSignal::Hangup],
            ..SupervisorConfig::default()
        })
        .register(Probe::running("api", Severity::Major, &stops))
        .build(),
    );
    let mut events = sup.events();

    let run = tokio::spawn({
        let sup = Arc::clone(&sup);
        async move { sup.start().await }
    });

    // Handlers are installed before the first process starts.
    loop {
        if events.recv().await?.kind == EventKind::ProcessStarting {
            break;
        }
    }
    let status = std::process::Command::new("kill")
        .args(["-HUP", &std::process::id().to_string()])
        .status()?;
    assert!(status.success());

    tokio::time::timeout(Duration::from_secs(2), run).await???;

    let reason = loop {
        let ev = events.recv().await?;
        if ev.kind == EventKind::ShutdownRequested {
            break ev.reason;
        }
    };
    assert_eq!(reason.as_deref(), Some("signal"));
    assert_eq!(sorted(&stops), ["api"]);
    Ok(())
}
