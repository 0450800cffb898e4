//! Job - one run scheduled for execution

use serde::{Deserialize, Serialize};

/// One run's entry in the execution queue.
///
/// Carries the external command, the resource requirement, and (once the
/// planner assigns it) the device identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    run_index: usize,
    run_name: String,
    command: String,
    needs_device: bool,
    device: Option<u32>,
}

impl Job {
    pub(crate) fn new(
        run_index: usize,
        run_name: String,
        command: String,
        needs_device: bool,
    ) -> Self {
        Self {
            run_index,
            run_name,
            command,
            needs_device,
            device: None,
        }
    }

    pub(crate) fn assign_device(&mut self, device: u32) {
        self.device = Some(device);
    }

    /// Row-major index of the run in its matrix.
    #[must_use]
    pub fn run_index(&self) -> usize {
        self.run_index
    }

    /// Run display name.
    #[must_use]
    pub fn run_name(&self) -> &str {
        &self.run_name
    }

    /// The external command the launcher executes for this job.
    #[must_use]
    pub fn command(&self) -> &str {
        &self.command
    }

    /// Whether this job occupies a device slot.
    #[must_use]
    pub fn needs_device(&self) -> bool {
        self.needs_device
    }

    /// Assigned device identifier, if the plan carries a device list.
    #[must_use]
    pub fn device(&self) -> Option<u32> {
        self.device
    }
}
