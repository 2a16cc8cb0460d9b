use std::future::Future;

use tokio::time;
use tracing::debug;

use crate::error::ExecutionError;
use crate::execution::backoff::BackoffPolicy;

/// Runs `action` up to `attempts` times, sleeping `backoff.next(n)` after the
/// `n`-th failure. There is no sleep after the final attempt.
///
/// `attempts = 0` is treated as a single attempt.
///
/// # Errors
/// [`ExecutionError::Exhausted`] with the error of the final attempt.
///
/// # Example
/// ```rust
/// use std::time::Duration;
/// use procvisor::{BackoffPolicy, run_with_retry};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let mut calls = 0;
/// let res = run_with_retry(3, &BackoffPolicy::constant(Duration::from_millis(1)), || {
///     calls += 1;
///     let n = calls;
///     async move { if n < 2 { Err("not yet") } else { Ok(n) } }
/// })
/// .await;
/// assert_eq!(res.unwrap(), 2);
/// # }
/// ```
pub async fn run_with_retry<T, E, F, Fut>(
    attempts: u32,
    backoff: &BackoffPolicy,
    mut action: F,
) -> Result<T, ExecutionError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let attempts = attempts.max(1);
    let mut attempt = 0;
    loop {
        match action().await {
            Ok(v) => return Ok(v),
            Err(last) if attempt + 1 >= attempts => {
                return Err(ExecutionError::Exhausted { attempts, last });
            }
            Err(e) => {
                let delay = backoff.next(attempt);
                debug!(attempt = attempt + 1, attempts, ?delay, error = %e, "attempt failed; retrying");
                time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
