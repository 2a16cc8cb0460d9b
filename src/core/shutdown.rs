//! # Cross-platform OS signal handling.
//!
//! [`ShutdownSignals`] installs listeners for a configured set of signals up front,
//! so registration failures surface before the run begins, and then
//! completes [`ShutdownSignals::recv`] when any of them arrives.
//!
//! **Unix:** each [`ShutdownSignal`] maps to its `SignalKind`.
//!
//! **Other platforms:** any non-empty set waits on [`tokio::signal::ctrl_c`].

use std::future::pending;

use crate::core::config::ShutdownSignal;

/// Installed signal listeners.
pub(crate) struct ShutdownSignals {
    #[cfg(unix)]
    streams: Vec<tokio::signal::unix::Signal>,
    #[cfg(not(unix))]
    ctrl_c: bool,
}

impl ShutdownSignals {
    /// Installs listeners for `signals`. Duplicates are ignored.
    #[cfg(unix)]
    pub(crate) fn install(signals: &[ShutdownSignal]) -> std::io::Result<Self> {
        use tokio::signal::unix::{SignalKind, signal};

        let mut kinds: Vec<SignalKind> = Vec::with_capacity(signals.len());
        for s in signals {
            let kind = match s {
                ShutdownSignal::Interrupt => SignalKind::interrupt(),
                ShutdownSignal::Terminate => SignalKind::terminate(),
                ShutdownSignal::Quit => SignalKind::quit(),
                ShutdownSignal::Hangup => SignalKind::hangup(),
            };
            if !kinds.contains(&kind) {
                kinds.push(kind);
            }
        }

        let streams = kinds
            .into_iter()
            .map(signal)
            .collect::<std::io::Result<Vec<_>>>()?;
        Ok(Self { streams })
    }

    /// Installs listeners for `signals`.
    #[cfg(not(unix))]
    pub(crate) fn install(signals: &[ShutdownSignal]) -> std::io::Result<Self> {
        Ok(Self {
            ctrl_c: !signals.is_empty(),
        })
    }

    /// Completes when any installed signal arrives; never completes for an empty set.
    #[cfg(unix)]
    pub(crate) async fn recv(&mut self) {
        if self.streams.is_empty() {
            return pending().await;
        }
        let waits = self.streams.iter_mut().map(|s| Box::pin(s.recv()));
        let _ = futures::future::select_all(waits).await;
    }

    /// Completes when Ctrl-C arrives; never completes for an empty set.
    #[cfg(not(unix))]
    pub(crate) async fn recv(&mut self) {
        if !self.ctrl_c {
            return pending().await;
        }
        if tokio::signal::ctrl_c().await.is_err() {
            pending::<()>().await;
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn empty_set_never_fires() {
        let mut signals = ShutdownSignals::install(&[]).unwrap();
        let res = tokio::time::timeout(Duration::from_millis(20), signals.recv()).await;
        assert!(res.is_err());
    }

    #[tokio::test]
    async fn duplicates_are_installed_once() {
        let signals = ShutdownSignals::install(&[
            ShutdownSignal::Hangup,
            ShutdownSignal::Hangup,
            ShutdownSignal::Terminate,
        ])
        .unwrap();
        assert_eq!(signals.streams.len(), 2);
    }
}
