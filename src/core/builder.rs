use std::sync::Arc;

use crate::core::{config::SupervisorConfig, supervisor::Supervisor};
use crate::process::ProcessRef;
use crate::subscribers::Subscribe;

/// Builder for a [`Supervisor`].
///
/// Registration lives here so that the set of processes is frozen once the
/// supervisor exists.
pub struct SupervisorBuilder {
    cfg: SupervisorConfig,
    processes: Vec<ProcessRef>,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl SupervisorBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: SupervisorConfig) -> Self {
        Self {
            cfg,
            processes: Vec::new(),
            subscribers: Vec::new(),
        }
    }

    /// Adds a process. Processes start concurrently, in no particular order.
    pub fn register(mut self, process: ProcessRef) -> Self {
        self.processes.push(process);
        self
    }

    /// Adds every process from `processes`.
    pub fn register_all(mut self, processes: impl IntoIterator<Item = ProcessRef>) -> Self {
        self.processes.extend(processes);
        self
    }

    /// Sets event subscribers.
    ///
    /// Subscribers receive lifecycle events through dedicated workers with bounded queues.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Builds the supervisor. Nothing runs until [`Supervisor::start`].
    pub fn build(self) -> Supervisor {
        Supervisor::new_internal(self.cfg, self.processes, self.subscribers)
    }
}
