//! # Managed processes.
//!
//! Every unit the [`Supervisor`](crate::Supervisor) runs implements [`ManagedProcess`]:
//! - [`ManagedProcess`] the contract (name, severity, `on_start`, `on_stop`)
//! - [`Severity`] whether a failure ends the whole system
//! - [`ProcessFn`] closure-backed implementation, [`ProcessRef`] shared handle
//! - [`PeriodicTask`] runs a handler on a fixed interval with cooperative draining

mod contract;
mod periodic;
mod process_fn;

pub use contract::{ManagedProcess, ProcessRef, Severity};
pub use periodic::{PeriodicConfig, PeriodicTask, TaskState};
pub use process_fn::ProcessFn;
