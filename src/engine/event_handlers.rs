// src/engine/event_handlers.rs

//! Event handling logic for the core runtime.

use tracing::{debug, info};

use crate::dag::{RunId, RunReport, RunRequest, ScheduledTask, Scheduler, SchedulerStep};
use crate::engine::{RuntimeOptions, TaskOutcome, TriggerReason};
use crate::types::TaskId;

/// Command produced by the pure core, to be executed by the outer IO shell.
#[derive(Debug, Clone)]
pub enum CoreCommand {
    /// Send these tasks to the executor.
    DispatchTasks(Vec<ScheduledTask>),
    /// A run reached a terminal state; surface it to the user.
    RunFinished(RunReport),
    /// Request that the process exits (one-shot commands once idle).
    RequestExit,
}

/// Decision returned by the core after handling a single `RuntimeEvent`.
#[derive(Debug, Clone)]
pub struct CoreStep {
    /// Commands the IO shell should execute, in order.
    pub commands: Vec<CoreCommand>,
    /// Whether the outer runtime loop should keep running.
    pub keep_running: bool,
}

/// Handle a run request.
///
/// Every request opens its own run. Requests are never merged into runs that
/// are already in flight, so two bindings firing together produce two
/// complete sequences.
pub fn handle_run_request(
    scheduler: &mut Scheduler,
    options: &RuntimeOptions,
    request: RunRequest,
    reason: TriggerReason,
) -> CoreStep {
    info!(%request, ?reason, "run requested");
    let step = scheduler.start_run(request);
    finish_step(scheduler, options, step)
}

/// Handle a task completion event.
pub fn handle_task_completion(
    scheduler: &mut Scheduler,
    options: &RuntimeOptions,
    run_id: RunId,
    task: TaskId,
    outcome: TaskOutcome,
) -> CoreStep {
    debug!(run_id, task = %task, ?outcome, "task completion");
    let step = scheduler.handle_completion(run_id, task, outcome);
    finish_step(scheduler, options, step)
}

fn finish_step(
    scheduler: &Scheduler,
    options: &RuntimeOptions,
    step: SchedulerStep,
) -> CoreStep {
    let mut commands = Vec::new();

    if !step.newly_scheduled.is_empty() {
        commands.push(CoreCommand::DispatchTasks(step.newly_scheduled));
    }
    if let Some(report) = step.finished {
        commands.push(CoreCommand::RunFinished(report));
    }

    let mut keep_running = true;
    if options.exit_when_idle && scheduler.is_idle() {
        keep_running = false;
        commands.push(CoreCommand::RequestExit);
    }

    CoreStep {
        commands,
        keep_running,
    }
}
