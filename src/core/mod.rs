//! Runtime core: the supervisor and its units of work.
//!
//! The public API from this module is [`Supervisor`] (with its builder, stop
//! handle and configuration).
//!
//! Internal modules:
//! - [`runner`]: the per-process runner and stopper units;
//! - [`group`]: fan-in join over all units (first error wins, cancel on failure);
//! - [`shutdown`]: cross-platform shutdown signal handling;
//! - [`supervisor`]: wires the units, signals and subscribers together.

mod builder;
mod config;
mod group;
mod handle;
mod runner;
mod shutdown;
mod supervisor;

pub use builder::SupervisorBuilder;
pub use config::{ShutdownSignal, SupervisorConfig};
pub use handle::StopHandle;
pub use supervisor::Supervisor;
