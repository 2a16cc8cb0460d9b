use std::future::Future;
use std::time::Duration;

use tokio::time;
use tokio_util::sync::CancellationToken;

use crate::error::ExecutionError;

/// Awaits `work` until it finishes, `timeout` passes or `parent` is cancelled.
///
/// The work runs on the calling task: it is dropped when the deadline or the
/// cancellation wins, and a panic inside it unwinds into the caller.
///
/// # Errors
/// - [`ExecutionError::Timeout`] when the deadline passes first.
/// - [`ExecutionError::Canceled`] when `parent` is cancelled first.
/// - [`ExecutionError::Failed`] with the work's own error.
pub async fn run_with_timeout<T, E, F>(
    parent: &CancellationToken,
    timeout: Duration,
    work: F,
) -> Result<T, ExecutionError<E>>
where
    F: Future<Output = Result<T, E>>,
{
    tokio::select! {
        biased;
        res = work => res.map_err(ExecutionError::Failed),
        _ = parent.cancelled() => Err(ExecutionError::Canceled),
        _ = time::sleep(timeout) => Err(ExecutionError::Timeout { timeout }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn slow_work_times_out() {
        let res = run_with_timeout(&CancellationToken::new(), Duration::from_millis(1), async {
            time::sleep(Duration::from_secs(1)).await;
            Ok::<_, String>(())
        })
        .await;
        assert!(matches!(
            res,
            Err(ExecutionError::Timeout { timeout }) if timeout == Duration::from_millis(1)
        ));
    }

    #[tokio::test]
    async fn finished_work_passes_through() {
        let token = CancellationToken::new();
        let ok = run_with_timeout(&token, Duration::from_secs(1), async { Ok::<_, String>(5) });
        let ok = ok.await;
        assert_eq!(ok.unwrap(), 5);

        let failed = run_with_timeout(&token, Duration::from_secs(1), async {
            Err::<(), _>("bad input".to_string())
        })
        .await;
        assert_eq!(failed.unwrap_err().to_string(), "bad input");
    }

    #[tokio::test]
    async fn parent_cancellation_wins() {
        let token = CancellationToken::new();
        token.cancel();
        let pending = std::future::pending::<Result<(), String>>();
        let res = run_with_timeout(&token, Duration::from_secs(1), pending).await;
        assert!(matches!(res, Err(ExecutionError::Canceled)));
    }

    #[tokio::test]
    #[should_panic(expected = "exploded")]
    async fn panic_reaches_the_caller() {
        async fn explode() -> Result<(), String> {
            panic!("exploded")
        }
        let _ = run_with_timeout(&CancellationToken::new(), Duration::from_secs(1), explode()).await;
    }
}
