// src/dag/scheduler.rs

use std::collections::BTreeMap;

use tracing::{debug, info, warn};

use crate::dag::graph::{RunRequest, TaskGraph};
use crate::dag::run::Run;
use crate::dag::scheduler_step::SchedulerStep;
use crate::dag::task_info::{RunId, TaskRunState};
use crate::engine::TaskOutcome;
use crate::types::TaskId;

/// Scheduler holds the immutable task graph plus every in-flight run.
///
/// Runs are independent: a style change and a script change produce two
/// runs that progress concurrently, each with its own state. The scheduler
/// is responsible for:
/// - creating a run for a request and dispatching its root tasks
/// - marking tasks as succeeded/failed
/// - scheduling dependents once their in-run dependencies succeeded
/// - failing dependents when a task fails (the run never reaches them)
/// - reporting each run exactly once when it becomes terminal
#[derive(Debug)]
pub struct Scheduler {
    graph: TaskGraph,
    runs: BTreeMap<RunId, Run>,
    run_counter: RunId,
}

impl Scheduler {
    pub fn new(graph: TaskGraph) -> Self {
        Self {
            graph,
            runs: BTreeMap::new(),
            run_counter: 0,
        }
    }

    /// Returns `true` if there are no in-flight runs.
    pub fn is_idle(&self) -> bool {
        self.runs.is_empty()
    }

    /// IDs of all in-flight runs, oldest first.
    pub fn active_runs(&self) -> Vec<RunId> {
        self.runs.keys().copied().collect()
    }

    /// Read-only view of a task's state in an in-flight run.
    ///
    /// Returns `None` if the run is unknown or already finished.
    pub fn run_state_of(&self, run_id: RunId, task: TaskId) -> Option<TaskRunState> {
        self.runs.get(&run_id).map(|run| run.state_of(task))
    }

    /// Start a new run and return its initially ready tasks.
    pub fn start_run(&mut self, request: RunRequest) -> SchedulerStep {
        self.run_counter += 1;
        let run_id = self.run_counter;

        let mut run = Run::new(run_id, request, &self.graph);
        let newly_scheduled = run.collect_new_ready_tasks(&self.graph);

        info!(
            run_id,
            %request,
            ready = ?newly_scheduled.iter().map(|t| t.task).collect::<Vec<_>>(),
            "scheduler: starting run"
        );

        self.runs.insert(run_id, run);

        SchedulerStep {
            run_id,
            newly_scheduled,
            newly_failed: Vec::new(),
            finished: self.maybe_finish_run(run_id),
        }
    }

    /// Handle completion of a task with a concrete outcome.
    pub fn handle_completion(
        &mut self,
        run_id: RunId,
        task: TaskId,
        outcome: TaskOutcome,
    ) -> SchedulerStep {
        let Some(run) = self.runs.get_mut(&run_id) else {
            warn!(run_id, task = %task, "completion for unknown or finished run; ignoring");
            return SchedulerStep::empty(run_id);
        };

        let mut step = SchedulerStep::empty(run_id);

        match outcome {
            TaskOutcome::Success => {
                if !run.record_success(task) {
                    warn!(run_id, task = %task, "completion for task that is not running; ignoring");
                    return step;
                }
                debug!(run_id, task = %task, "task completed successfully");
                step.newly_scheduled = run.collect_new_ready_tasks(&self.graph);
            }
            TaskOutcome::Failed(code) => {
                step.newly_failed = run.record_failure(&self.graph, task, code);
                if step.newly_failed.is_empty() {
                    warn!(run_id, task = %task, "failure for task that is not running; ignoring");
                    return step;
                }
                warn!(
                    run_id,
                    task = %task,
                    exit_code = code,
                    blocked = ?&step.newly_failed[1..],
                    "task failed; dependents in this run will not run"
                );
            }
        }

        step.finished = self.maybe_finish_run(run_id);
        step
    }

    /// Remove the run if all its tasks are terminal and return its report.
    fn maybe_finish_run(&mut self, run_id: RunId) -> Option<crate::dag::run::RunReport> {
        let finished = self.runs.get(&run_id).is_some_and(Run::is_finished);
        if !finished {
            return None;
        }

        let run = self.runs.remove(&run_id)?;
        let report = run.report();
        info!(
            run_id,
            request = %report.request,
            success = report.outcome.is_success(),
            "scheduler: run finished"
        );
        Some(report)
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new(TaskGraph::site())
    }
}
