// src/exec/backend.rs

//! Pluggable executor backend abstraction.
//!
//! The runtime talks to an `ExecutorBackend` instead of running tasks
//! itself. Production uses [`RealExecutorBackend`]; tests provide their own
//! implementation that records tasks and emits `TaskCompleted` events
//! without touching the filesystem.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};

use crate::dag::ScheduledTask;
use crate::engine::RuntimeEvent;
use crate::errors::Result;
use crate::serve::ReloadNotifier;
use crate::transform::Pipeline;

use super::task_runner::run_task;

/// Trait abstracting how scheduled tasks are executed.
pub trait ExecutorBackend: Send {
    /// Dispatch the given tasks for execution.
    ///
    /// Implementations must eventually send exactly one
    /// `RuntimeEvent::TaskCompleted` per task.
    fn spawn_ready_tasks(
        &mut self,
        tasks: Vec<ScheduledTask>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}

/// Everything a task needs to run, shared by all in-flight tasks.
pub struct TaskContext {
    pub pipeline: Arc<Pipeline>,
    pub notifier: Arc<dyn ReloadNotifier>,
    /// Held for the whole generator subprocess; generator runs never overlap.
    pub generator_lock: Mutex<()>,
}

impl TaskContext {
    pub fn new(pipeline: Arc<Pipeline>, notifier: Arc<dyn ReloadNotifier>) -> Self {
        Self {
            pipeline,
            notifier,
            generator_lock: Mutex::new(()),
        }
    }
}

impl fmt::Debug for TaskContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskContext")
            .field("root", &self.pipeline.root())
            .finish_non_exhaustive()
    }
}

/// Real executor backend used in production.
///
/// Every scheduled task becomes its own Tokio task, so tasks of the same run
/// (the four transforms of a full build) and tasks of different runs
/// progress concurrently.
#[derive(Debug)]
pub struct RealExecutorBackend {
    ctx: Arc<TaskContext>,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
}

impl RealExecutorBackend {
    pub fn new(ctx: Arc<TaskContext>, runtime_tx: mpsc::Sender<RuntimeEvent>) -> Self {
        Self { ctx, runtime_tx }
    }
}

impl ExecutorBackend for RealExecutorBackend {
    fn spawn_ready_tasks(
        &mut self,
        tasks: Vec<ScheduledTask>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let ctx = Arc::clone(&self.ctx);
        let tx = self.runtime_tx.clone();

        Box::pin(async move {
            for task in tasks {
                tokio::spawn(run_task(task, Arc::clone(&ctx), tx.clone()));
            }
            Ok(())
        })
    }
}
