//! Execution planning - the scheduling core
//!
//! [`build_plan`] flattens a [`RunMatrix`](crate::matrix::RunMatrix) into
//! an ordered job queue with round-robin device assignment and a bounded
//! concurrency policy. The plan is a *static priority order* plus a
//! *dynamic admission rule*: job durations are unknown ahead of time, so
//! the external launcher pulls the next unlaunched job whenever a slot
//! frees up (FIFO, non-preemptive).
//!
//! The planner itself never spawns processes. Scheduling logic lives in
//! plain data structures, and the textual launcher script is only a
//! serialization adapter over them, so the whole thing is testable without
//! executing anything.
//!
//! Errors discovered during planning abort plan construction entirely; no
//! partial plan is ever emitted.

mod job;
mod script;

pub use job::Job;

use crate::error::{Error, Result};
use crate::matrix::RunMatrix;
use crate::results::POSTERIOR_MEANS_FILE;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Resource description consumed by [`build_plan`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannerConfig {
    /// Global concurrency cap: at most this many jobs run at once
    pub max_concurrent: usize,
    /// Ordered device identifiers (e.g. GPU indices); empty = CPU-only
    pub devices: Vec<u32>,
    /// Filter out jobs whose run already has a completion marker on disk,
    /// so re-planning a partially finished matrix resumes instead of
    /// restarting
    pub skip_completed: bool,
    /// Whether jobs require a device slot; with an empty device list this
    /// is a planning-time error
    pub require_device: bool,
    /// Seconds the launcher sleeps between free-slot polls
    pub poll_interval_secs: u64,
    /// Command prefix invoked once per run; the run and data directories
    /// are appended as arguments
    pub trainer_command: String,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            max_concurrent: 1,
            devices: Vec::new(),
            skip_completed: true,
            require_device: false,
            poll_interval_secs: 5,
            trainer_command: "run_lfads".to_string(),
        }
    }
}

/// An ordered job queue plus the concurrency/device policy.
///
/// Purely a projection over the runs it orders; holds no independent
/// state. Serializable as JSON, or as a launcher script via
/// [`to_launcher_script`](Self::to_launcher_script).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionPlan {
    jobs: Vec<Job>,
    max_concurrent: usize,
    devices: Vec<u32>,
    poll_interval_secs: u64,
}

impl ExecutionPlan {
    pub(crate) fn new(
        jobs: Vec<Job>,
        max_concurrent: usize,
        devices: Vec<u32>,
        poll_interval_secs: u64,
    ) -> Self {
        Self {
            jobs,
            max_concurrent,
            devices,
            poll_interval_secs,
        }
    }

    /// Jobs in submission-priority (row-major) order.
    #[must_use]
    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    /// Number of jobs in the queue.
    #[must_use]
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    /// Whether the queue is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Global concurrency cap.
    #[must_use]
    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    /// Device list the round-robin assignment draws from.
    #[must_use]
    pub fn devices(&self) -> &[u32] {
        &self.devices
    }

    /// Launcher poll interval in seconds.
    #[must_use]
    pub fn poll_interval_secs(&self) -> u64 {
        self.poll_interval_secs
    }

    /// Render the plan as a standalone bash launcher script.
    ///
    /// Executing the script reproduces the scheduling behavior exactly:
    /// FIFO admission under the concurrency cap, the literal ordered
    /// (command, device) list, per-job exit status reporting, and
    /// continue-on-failure semantics.
    #[must_use]
    pub fn to_launcher_script(&self) -> String {
        script::render(self)
    }
}

/// Build an execution plan for every pending run of the matrix.
///
/// 1. Flatten the matrix in row-major `(param_index, spec_index)` order;
///    this fixes submission priority.
/// 2. If `skip_completed`, drop jobs whose run already has its output
///    artifact on disk.
/// 3. Assign devices round-robin over the admitted order: the k-th job
///    receives `devices[k % devices.len()]`. Under FIFO admission the
///    launch order equals the submission order, so the assignment is
///    fixed at plan time.
///
/// # Errors
///
/// Returns [`Error::Scheduling`] and emits no partial plan if:
/// - `max_concurrent` is zero
/// - jobs require a device but the device list is empty
/// - any pending run's shared data bucket has not been prepared (the
///   planner never schedules a job whose hard dependency is missing)
pub fn build_plan(matrix: &RunMatrix, config: &PlannerConfig) -> Result<ExecutionPlan> {
    if config.max_concurrent == 0 {
        return Err(Error::Scheduling(
            "max_concurrent must be at least 1".to_string(),
        ));
    }
    if config.require_device && config.devices.is_empty() {
        return Err(Error::Scheduling(
            "jobs require a device but the device list is empty".to_string(),
        ));
    }

    let mut jobs = Vec::new();
    for (run_index, run) in matrix.runs().iter().enumerate() {
        let completed = run.run_dir().join(POSTERIOR_MEANS_FILE).is_file();
        if config.skip_completed && completed {
            debug!(run = %run.name(), "skipping completed run");
            continue;
        }
        if !run.input_prepared() {
            return Err(Error::Scheduling(format!(
                "shared data bucket data_{} for run '{}' has not been prepared",
                run.data_bucket(),
                run.name()
            )));
        }
        let command = format!(
            "{} --run_dir '{}' --data_dir '{}'",
            config.trainer_command,
            run.run_dir().display(),
            run.common_data_dir().display()
        );
        jobs.push(Job::new(
            run_index,
            run.name().to_string(),
            command,
            config.require_device,
        ));
    }

    if !config.devices.is_empty() {
        for (k, job) in jobs.iter_mut().enumerate() {
            job.assign_device(config.devices[k % config.devices.len()]);
        }
    }

    info!(
        jobs = jobs.len(),
        max_concurrent = config.max_concurrent,
        devices = config.devices.len(),
        "built execution plan"
    );
    Ok(ExecutionPlan::new(
        jobs,
        config.max_concurrent,
        config.devices.clone(),
        config.poll_interval_secs,
    ))
}
