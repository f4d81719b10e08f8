use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use sitedag::dag::{RunId, ScheduledTask};
use sitedag::engine::{RuntimeEvent, TaskOutcome};
use sitedag::errors::Result;
use sitedag::exec::ExecutorBackend;
use sitedag::serve::ReloadNotifier;
use sitedag::types::TaskId;

/// One task execution as seen by the fake executor.
#[derive(Debug, Clone)]
pub struct ExecutionRecord {
    pub run_id: RunId,
    pub task: TaskId,
    pub started: Instant,
    pub finished: Instant,
    pub outcome: TaskOutcome,
}

/// Per-task behaviour: how long the task "runs" and how it ends.
#[derive(Debug, Clone, Copy)]
pub struct TaskScript {
    pub delay: Duration,
    pub outcome: TaskOutcome,
}

impl Default for TaskScript {
    fn default() -> Self {
        Self {
            delay: Duration::from_millis(5),
            outcome: TaskOutcome::Success,
        }
    }
}

/// A fake executor that:
/// - runs every scheduled task as a Tokio task that sleeps for its scripted
///   delay and then reports the scripted outcome
/// - records start/finish timestamps of every execution
/// - calls the notifier's `reload` for successful `reload` tasks
pub struct FakeExecutor {
    runtime_tx: mpsc::Sender<RuntimeEvent>,
    scripts: HashMap<TaskId, TaskScript>,
    records: Arc<Mutex<Vec<ExecutionRecord>>>,
    notifier: Option<Arc<dyn ReloadNotifier>>,
}

impl FakeExecutor {
    pub fn new(runtime_tx: mpsc::Sender<RuntimeEvent>) -> Self {
        Self {
            runtime_tx,
            scripts: HashMap::new(),
            records: Arc::new(Mutex::new(Vec::new())),
            notifier: None,
        }
    }

    pub fn with_delay(mut self, task: TaskId, delay: Duration) -> Self {
        self.scripts.entry(task).or_default().delay = delay;
        self
    }

    pub fn failing(mut self, task: TaskId, code: i32) -> Self {
        self.scripts.entry(task).or_default().outcome = TaskOutcome::Failed(code);
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn ReloadNotifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Shared handle to the execution log; stays valid after the executor
    /// moved into a runtime.
    pub fn records(&self) -> Arc<Mutex<Vec<ExecutionRecord>>> {
        Arc::clone(&self.records)
    }
}

impl ExecutorBackend for FakeExecutor {
    fn spawn_ready_tasks(
        &mut self,
        tasks: Vec<ScheduledTask>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let tx = self.runtime_tx.clone();
        let records = Arc::clone(&self.records);
        let scripts = self.scripts.clone();
        let notifier = self.notifier.clone();

        Box::pin(async move {
            for t in tasks {
                let script = scripts.get(&t.task).copied().unwrap_or_default();
                let tx = tx.clone();
                let records = Arc::clone(&records);
                let notifier = notifier.clone();

                tokio::spawn(async move {
                    let started = Instant::now();
                    tokio::time::sleep(script.delay).await;

                    if t.task == TaskId::Reload && script.outcome == TaskOutcome::Success {
                        if let Some(n) = &notifier {
                            n.reload();
                        }
                    }

                    records.lock().unwrap().push(ExecutionRecord {
                        run_id: t.run_id,
                        task: t.task,
                        started,
                        finished: Instant::now(),
                        outcome: script.outcome,
                    });

                    let _ = tx
                        .send(RuntimeEvent::TaskCompleted {
                            run_id: t.run_id,
                            task: t.task,
                            outcome: script.outcome,
                        })
                        .await;
                });
            }
            Ok(())
        })
    }
}
