//! Error types used by the procvisor runtime, managed processes and building blocks.
//!
//! - [`RuntimeError`] errors raised by the supervisor itself.
//! - [`ProcessError`] errors raised by a managed process (`on_start` / `on_stop`).
//! - [`ConfigError`] invalid configuration, raised at construction time.
//! - [`BreakerError`] outcome of a rejected or failed circuit breaker call.
//! - [`ExecutionError`] outcome of the retry/timeout execution helpers.
//!
//! Types provide `as_label` for logs/metrics.

use std::num::ParseIntError;
use std::time::Duration;

use thiserror::Error;

use crate::process::Severity;

/// # Errors produced by the supervisor.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// A Major process failed in `on_start`; the whole system was shut down.
    #[error("process {name:?} ({severity}) failed to start: {source}")]
    StartFailed {
        /// Name of the failing process.
        name: String,
        /// Severity of the failing process.
        severity: Severity,
        /// The error returned by the process.
        source: ProcessError,
    },

    /// A process returned an error from `on_stop` (including a stop deadline hit).
    #[error("process {name:?} failed to stop: {source}")]
    StopFailed {
        /// Name of the failing process.
        name: String,
        /// The error returned by the process (or [`ProcessError::StopTimeout`]).
        source: ProcessError,
    },

    /// OS signal handlers could not be installed.
    #[error("failed to install shutdown signal handlers: {0}")]
    Signal(#[from] std::io::Error),

    /// A unit of work could not be joined (aborted by the runtime).
    #[error("supervised unit aborted: {reason}")]
    Aborted {
        /// Join failure description.
        reason: String,
    },

    /// `start` was called on a supervisor that already ran.
    #[error("supervisor already started")]
    AlreadyStarted,
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use procvisor::RuntimeError;
    ///
    /// assert_eq!(RuntimeError::AlreadyStarted.as_label(), "runtime_already_started");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::StartFailed { .. } => "runtime_start_failed",
            RuntimeError::StopFailed { .. } => "runtime_stop_failed",
            RuntimeError::Signal(_) => "runtime_signal",
            RuntimeError::Aborted { .. } => "runtime_aborted",
            RuntimeError::AlreadyStarted => "runtime_already_started",
        }
    }

    /// True when the error only reports cooperative cancellation.
    ///
    /// The supervisor treats such errors as a normal shutdown.
    pub fn is_cancellation(&self) -> bool {
        matches!(
            self,
            RuntimeError::StartFailed {
                source: ProcessError::Canceled,
                ..
            } | RuntimeError::StopFailed {
                source: ProcessError::Canceled,
                ..
            }
        )
    }
}

/// # Errors produced by managed processes.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ProcessError {
    /// The process failed.
    #[error("execution failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// The process observed cancellation and exited.
    #[error("context cancelled")]
    Canceled,

    /// The bounded stop context expired before `on_stop` returned.
    #[error("stop timed out after {timeout:?}")]
    StopTimeout {
        /// The configured stop timeout.
        timeout: Duration,
    },

    /// The process panicked; caught at the unit boundary.
    #[error("panicked: {message}")]
    Panicked {
        /// Panic payload rendered as text.
        message: String,
    },
}

impl ProcessError {
    /// Shorthand for [`ProcessError::Fail`].
    pub fn fail(error: impl std::fmt::Display) -> Self {
        ProcessError::Fail {
            error: error.to_string(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            ProcessError::Fail { .. } => "process_failed",
            ProcessError::Canceled => "process_canceled",
            ProcessError::StopTimeout { .. } => "process_stop_timeout",
            ProcessError::Panicked { .. } => "process_panicked",
        }
    }
}

/// # Invalid configuration, raised when a component is constructed.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A numeric setting could not be parsed.
    #[error("failed to parse {field}={value:?}: {source}")]
    InvalidNumber {
        /// Name of the setting.
        field: &'static str,
        /// Raw value that failed to parse.
        value: String,
        /// Parser error.
        source: ParseIntError,
    },

    /// A periodic task was configured with a zero interval.
    #[error("execution interval must be greater than zero")]
    InvalidInterval,

    /// Environment lookup failed.
    #[error("failed to load configuration from env: {0}")]
    Env(#[from] envconfig::Error),
}

impl ConfigError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            ConfigError::InvalidNumber { .. } => "config_invalid_number",
            ConfigError::InvalidInterval => "config_invalid_interval",
            ConfigError::Env(_) => "config_env",
        }
    }
}

/// # Outcome of a circuit breaker call that did not succeed.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum BreakerError<E> {
    /// The breaker is open; the action was not attempted.
    #[error("circuit breaker is open")]
    Open,

    /// The action ran and failed.
    #[error("{0}")]
    Action(E),
}

impl<E> BreakerError<E> {
    /// True for [`BreakerError::Open`].
    pub fn is_open(&self) -> bool {
        matches!(self, BreakerError::Open)
    }

    /// Returns the action error, if the action ran.
    pub fn into_action(self) -> Option<E> {
        match self {
            BreakerError::Open => None,
            BreakerError::Action(e) => Some(e),
        }
    }
}

/// # Outcome of the execution helpers.
#[derive(Error, Debug)]
pub enum ExecutionError<E> {
    /// Every attempt failed.
    #[error("failed to execute in {attempts} attempts, last error: {last}")]
    Exhausted {
        /// Number of attempts made.
        attempts: u32,
        /// Error of the final attempt.
        last: E,
    },

    /// The deadline passed before the work finished.
    #[error("timed out after {timeout:?}")]
    Timeout {
        /// The configured timeout.
        timeout: Duration,
    },

    /// The parent token was cancelled before the work finished.
    #[error("context cancelled")]
    Canceled,

    /// The work finished in time with its own error.
    #[error("{0}")]
    Failed(E),
}

impl<E> ExecutionError<E> {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            ExecutionError::Exhausted { .. } => "execution_exhausted",
            ExecutionError::Timeout { .. } => "execution_timeout",
            ExecutionError::Canceled => "execution_canceled",
            ExecutionError::Failed(_) => "execution_failed",
        }
    }
}

/// Renders a caught panic payload as text.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
