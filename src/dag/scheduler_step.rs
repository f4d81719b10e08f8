// src/dag/scheduler_step.rs

//! Step-by-step execution result type for the scheduler.

use crate::dag::run::RunReport;
use crate::dag::task_info::{RunId, ScheduledTask};
use crate::types::TaskId;

/// Structured result of a single scheduler "step".
#[derive(Debug, Clone)]
pub struct SchedulerStep {
    /// The run this step applied to.
    pub run_id: RunId,
    /// Tasks that became ready to run as a result of this step.
    pub newly_scheduled: Vec<ScheduledTask>,
    /// Tasks newly marked failed (the failing task and blocked dependents).
    pub newly_failed: Vec<TaskId>,
    /// Set when this step brought the run to a terminal state.
    pub finished: Option<RunReport>,
}

impl SchedulerStep {
    pub(crate) fn empty(run_id: RunId) -> Self {
        Self {
            run_id,
            newly_scheduled: Vec::new(),
            newly_failed: Vec::new(),
            finished: None,
        }
    }
}
