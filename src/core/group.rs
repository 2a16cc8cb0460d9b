//! # Fan-in group: wait for all units, keep the first failure.
//!
//! [`UnitGroup`] spawns supervised units of work on a [`JoinSet`] and joins them:
//! - every unit shares one [`CancellationToken`] (a child of the supervisor's root);
//! - the first failing unit cancels that token, pushing every other unit into its
//!   shutdown path;
//! - `wait` returns once **all** units have completed.
//!
//! ## Error selection
//! ```text
//! first non-cancellation error  ─► returned
//! only cancellation errors      ─► first of them returned (caller treats as clean)
//! later errors                  ─► logged at warn, not returned
//! ```

use std::future::Future;

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::error::RuntimeError;

pub(crate) struct UnitGroup {
    set: JoinSet<Result<(), RuntimeError>>,
    token: CancellationToken,
}

impl UnitGroup {
    /// Creates a group whose shared token is a child of `parent`.
    pub(crate) fn new(parent: &CancellationToken) -> Self {
        Self {
            set: JoinSet::new(),
            token: parent.child_token(),
        }
    }

    /// Shared token, cancelled on the first failure or when the parent is cancelled.
    pub(crate) fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub(crate) fn spawn<F>(&mut self, unit: F)
    where
        F: Future<Output = Result<(), RuntimeError>> + Send + 'static,
    {
        self.set.spawn(unit);
    }

    /// Joins every unit and returns the selected error, if any.
    pub(crate) async fn wait(mut self) -> Result<(), RuntimeError> {
        let mut first: Option<RuntimeError> = None;

        while let Some(joined) = self.set.join_next().await {
            let res = joined.unwrap_or_else(|e| {
                Err(RuntimeError::Aborted {
                    reason: e.to_string(),
                })
            });
            let Err(err) = res else { continue };

            self.token.cancel();
            first = match first {
                None => Some(err),
                Some(prev) if prev.is_cancellation() && !err.is_cancellation() => {
                    warn!(error = %prev, "secondary error");
                    Some(err)
                }
                Some(prev) => {
                    warn!(error = %err, label = err.as_label(), "secondary error");
                    Some(prev)
                }
            };
        }

        match first {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProcessError;
    use crate::process::Severity;
    use std::time::Duration;

    fn failed(name: &str, source: ProcessError) -> RuntimeError {
        RuntimeError::StartFailed {
            name: name.into(),
            severity: Severity::Major,
            source,
        }
    }

    #[tokio::test]
    async fn empty_group_is_ok() {
        let root = CancellationToken::new();
        assert!(UnitGroup::new(&root).wait().await.is_ok());
    }

    #[tokio::test]
    async fn first_failure_cancels_siblings() {
        let root = CancellationToken::new();
        let mut group = UnitGroup::new(&root);

        let token = group.token().clone();
        group.spawn(async move {
            token.cancelled().await;
            Ok(())
        });
        group.spawn(async { Err(failed("a", ProcessError::fail("boom"))) });

        let err = group.wait().await.unwrap_err();
        assert!(matches!(err, RuntimeError::StartFailed { ref name, .. } if name == "a"));
        assert!(!root.is_cancelled(), "failure must not leak into the parent");
    }

    #[tokio::test]
    async fn real_error_wins_over_cancellation() {
        let root = CancellationToken::new();
        let mut group = UnitGroup::new(&root);

        group.spawn(async { Err(failed("c", ProcessError::Canceled)) });
        let token = group.token().clone();
        group.spawn(async move {
            token.cancelled().await;
            tokio::time::sleep(Duration::from_millis(5)).await;
            Err(failed("b", ProcessError::fail("late")))
        });

        let err = group.wait().await.unwrap_err();
        assert!(!err.is_cancellation());
        assert!(matches!(err, RuntimeError::StartFailed { ref name, .. } if name == "b"));
    }

    #[tokio::test]
    async fn parent_cancellation_reaches_units() {
        let root = CancellationToken::new();
        let mut group = UnitGroup::new(&root);
        let token = group.token().clone();
        group.spawn(async move {
            token.cancelled().await;
            Ok(())
        });

        root.cancel();
        assert!(group.wait().await.is_ok());
    }
}
