// src/dag/run.rs

//! State of a single run: which tasks take part, where each one is, and how
//! the run ended.

use std::collections::BTreeMap;
use std::fmt;

use tracing::debug;

use crate::dag::graph::{RunRequest, TaskGraph};
use crate::dag::task_info::{RunId, RunState, ScheduledTask, TaskRunState};
use crate::types::TaskId;

/// Final result of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Succeeded,
    /// The first task that failed, with its exit code (-1 if it had none).
    Failed { task: TaskId, code: i32 },
}

impl RunOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, RunOutcome::Succeeded)
    }
}

/// Summary emitted once when a run reaches a terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunReport {
    pub run_id: RunId,
    pub request: RunRequest,
    pub outcome: RunOutcome,
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.outcome {
            RunOutcome::Succeeded => write!(f, "{} (run {}) succeeded", self.request, self.run_id),
            RunOutcome::Failed { task, code } => write!(
                f,
                "{} (run {}) failed in task '{}' (code {})",
                self.request, self.run_id, task, code
            ),
        }
    }
}

/// One in-flight run over a subset of the task graph.
#[derive(Debug, Clone)]
pub struct Run {
    id: RunId,
    request: RunRequest,
    states: BTreeMap<TaskId, RunState>,
    first_failure: Option<(TaskId, i32)>,
}

impl Run {
    pub fn new(id: RunId, request: RunRequest, graph: &TaskGraph) -> Self {
        let states = graph
            .plan(request)
            .into_iter()
            .map(|task| (task, RunState::Pending))
            .collect();
        Self {
            id,
            request,
            states,
            first_failure: None,
        }
    }

    pub fn state_of(&self, task: TaskId) -> TaskRunState {
        self.states.get(&task).copied().into()
    }

    /// Whether every in-run dependency of `task` has succeeded.
    ///
    /// Dependencies outside the run count as satisfied: their previous
    /// outputs are already on disk.
    pub fn deps_satisfied(&self, graph: &TaskGraph, task: TaskId) -> bool {
        graph
            .dependencies_of(task)
            .into_iter()
            .all(|dep| match self.states.get(&dep) {
                None | Some(RunState::DoneSuccess) => true,
                Some(RunState::Pending | RunState::Running | RunState::DoneFailed) => false,
            })
    }

    /// Mark `Pending` tasks with satisfied dependencies as `Running` and
    /// return them for dispatch.
    pub fn collect_new_ready_tasks(&mut self, graph: &TaskGraph) -> Vec<ScheduledTask> {
        let candidates: Vec<TaskId> = self
            .states
            .iter()
            .filter(|(task, state)| {
                **state == RunState::Pending && self.deps_satisfied(graph, **task)
            })
            .map(|(task, _)| *task)
            .collect();

        candidates
            .into_iter()
            .map(|task| {
                debug!(run_id = self.id, task = %task, "dependencies satisfied; marking Running");
                self.states.insert(task, RunState::Running);
                ScheduledTask {
                    run_id: self.id,
                    task,
                    request: self.request,
                }
            })
            .collect()
    }

    /// Record that a running task finished.
    ///
    /// Returns `false` if the task was not running in this run (stale or
    /// duplicate completion), in which case nothing changes.
    pub fn record_success(&mut self, task: TaskId) -> bool {
        match self.states.get_mut(&task) {
            Some(state) if *state == RunState::Running => {
                *state = RunState::DoneSuccess;
                true
            }
            _ => false,
        }
    }

    /// Record a failure and fail all in-run dependents that have not started.
    ///
    /// Returns the tasks newly marked failed, starting with `task` itself, or
    /// an empty list if `task` was not running.
    pub fn record_failure(&mut self, graph: &TaskGraph, task: TaskId, code: i32) -> Vec<TaskId> {
        match self.states.get_mut(&task) {
            Some(state) if *state == RunState::Running => *state = RunState::DoneFailed,
            _ => return Vec::new(),
        }

        if self.first_failure.is_none() {
            self.first_failure = Some((task, code));
        }

        let mut newly_failed = vec![task];
        let mut stack = graph.dependents_of(task);

        while let Some(name) = stack.pop() {
            if let Some(state) = self.states.get_mut(&name) {
                if *state == RunState::Pending {
                    *state = RunState::DoneFailed;
                    debug!(
                        run_id = self.id,
                        task = %name,
                        "marking dependent as DoneFailed due to upstream failure"
                    );
                    newly_failed.push(name);
                    stack.extend(graph.dependents_of(name));
                }
            }
        }

        newly_failed
    }

    pub fn is_finished(&self) -> bool {
        self.states.values().all(|s| s.is_terminal())
    }

    pub fn outcome(&self) -> RunOutcome {
        match self.first_failure {
            Some((task, code)) => RunOutcome::Failed { task, code },
            None => RunOutcome::Succeeded,
        }
    }

    pub fn report(&self) -> RunReport {
        RunReport {
            run_id: self.id,
            request: self.request,
            outcome: self.outcome(),
        }
    }
}
