// src/exec/task_runner.rs

//! Runs a single scheduled task and reports its outcome.

use std::sync::Arc;

use anyhow::anyhow;
use tokio::sync::mpsc;
use tracing::{error, info};

use crate::dag::ScheduledTask;
use crate::engine::{RuntimeEvent, TaskOutcome};
use crate::errors::{Result, SiteError};
use crate::exec::backend::TaskContext;
use crate::exec::generator::run_generator;
use crate::types::TaskId;

/// Run one task and send exactly one `TaskCompleted` event for it.
pub async fn run_task(
    task: ScheduledTask,
    ctx: Arc<TaskContext>,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
) {
    info!(task = %task.task, run_id = task.run_id, request = %task.request, "starting task");

    let outcome = match execute(task.task, &ctx).await {
        Ok(()) => {
            info!(task = %task.task, run_id = task.run_id, "task finished");
            TaskOutcome::Success
        }
        Err(err) => {
            let code = err.task_code();
            error!(task = %task.task, run_id = task.run_id, code, error = %err, "task failed");
            TaskOutcome::Failed(code)
        }
    };

    if let Err(err) = runtime_tx
        .send(RuntimeEvent::TaskCompleted {
            run_id: task.run_id,
            task: task.task,
            outcome,
        })
        .await
    {
        error!(task = %task.task, run_id = task.run_id, "runtime gone; dropping completion: {err}");
    }
}

async fn execute(task: TaskId, ctx: &TaskContext) -> Result<()> {
    match task {
        TaskId::Generate => {
            let _guard = ctx.generator_lock.lock().await;
            let pipeline = &ctx.pipeline;
            run_generator(pipeline.root(), pipeline.config().generator()).await
        }
        TaskId::Reload => {
            ctx.notifier.reload();
            Ok(())
        }
        transform => {
            let class = transform
                .asset_class()
                .ok_or_else(|| SiteError::Other(anyhow!("{transform} is not a transform")))?;

            let pipeline = Arc::clone(&ctx.pipeline);
            let output = tokio::task::spawn_blocking(move || pipeline.run_transform(class))
                .await
                .map_err(|err| anyhow!("transform {class} panicked: {err}"))??;

            info!(
                task = %transform,
                produced = output.produced.len(),
                written = output.written_count(),
                "transform complete"
            );
            ctx.notifier.stream(&output.produced);
            Ok(())
        }
    }
}
