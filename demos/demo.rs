use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::info;

use procvisor::{
    BackoffPolicy, BreakerSettings, CircuitBreaker, Handler, LogWriter, MiddlewareChainResolver,
    PeriodicConfig, PeriodicTask, ProcessError, ProcessFn, Severity, Subscribe, Supervisor,
    SupervisorConfig, handler_fn, init_tracing, middleware_fn, run_with_retry,
};

#[tokio::main(flavor = "multi_thread")]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    // Route middleware: a global logger plus an auth check for the admin API.
    let mut routes = MiddlewareChainResolver::<String, String>::new();
    routes.register(
        "*",
        [middleware_fn(|next: Handler<String, String>| -> Handler<String, String> {
            handler_fn(move |req: String| {
                let next = Arc::clone(&next);
                async move {
                    info!(%req, "request");
                    next(req).await
                }
            })
        })],
    );
    routes.register(
        "/admin/*",
        [middleware_fn(|_next: Handler<String, String>| -> Handler<String, String> {
            handler_fn(|_req: String| async { "403 forbidden".to_string() })
        })],
    );
    let routes = Arc::new(routes);

    // Heartbeat: periodic, resolves a couple of routes on every tick.
    let beats = Arc::new(AtomicU64::new(0));
    let heartbeat = PeriodicTask::new(
        "heartbeat",
        PeriodicConfig {
            interval: Duration::from_millis(500),
            ..PeriodicConfig::default()
        },
        {
            let beats = Arc::clone(&beats);
            let routes = Arc::clone(&routes);
            move || {
                let n = beats.fetch_add(1, Ordering::Relaxed) + 1;
                let routes = Arc::clone(&routes);
                async move {
                    let ok = handler_fn(|req: String| async move { format!("200 {req}") });
                    let route = if n % 2 == 0 { "/admin/users" } else { "/status" };
                    let res = routes.resolve(route, ok)(route.to_string()).await;
                    info!(beat = n, route, %res, "heartbeat");
                    Ok::<(), ProcessError>(())
                }
            }
        },
        || info!("heartbeat drained"),
    )?;

    // Flaky upstream: guarded by a breaker, retried with backoff; Minor, so its
    // failure never takes the system down.
    let breaker = Arc::new(CircuitBreaker::from_settings(BreakerSettings {
        failure_limit: 2,
        reset_timeout: Duration::from_secs(1),
    }));
    let upstream = ProcessFn::arc(
        "upstream",
        Severity::Minor,
        move |_ctx: CancellationToken| {
            let breaker = Arc::clone(&breaker);
            async move {
                let backoff = BackoffPolicy {
                    first: Duration::from_millis(50),
                    ..BackoffPolicy::default()
                };
                run_with_retry(4, &backoff, || {
                    let breaker = Arc::clone(&breaker);
                    async move { breaker.proceed(|| Err::<(), _>("connection refused")) }
                })
                .await
                .map_err(ProcessError::fail)
            }
        },
        |_ctx: CancellationToken| async { Ok::<(), ProcessError>(()) },
    );

    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];
    let sup = Supervisor::builder(SupervisorConfig {
        stop_timeout: Duration::from_secs(5),
        ..SupervisorConfig::default()
    })
    .register(Arc::new(heartbeat))
    .register(upstream)
    .with_subscribers(subs)
    .build();

    // Stop on Ctrl-C / SIGTERM, or after a few seconds.
    let stop = sup.stop_handle();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(3)).await;
        stop.stop();
    });

    sup.start().await?;
    info!(beats = beats.load(Ordering::Relaxed), "done");
    Ok(())
}
