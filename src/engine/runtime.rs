// src/engine/runtime.rs

use std::fmt;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::dag::{RunReport, ScheduledTask};
use crate::errors::Result;
use crate::exec::ExecutorBackend;

use super::core::CoreRuntime;
use super::{CoreCommand, RuntimeEvent};

/// Drives the scheduler in response to `RuntimeEvent`s and delegates task
/// execution to an `ExecutorBackend`.
///
/// This is an IO shell around `CoreRuntime`, which contains all the runtime
/// semantics.
pub struct Runtime<E: ExecutorBackend> {
    core: CoreRuntime,
    event_rx: mpsc::Receiver<RuntimeEvent>,
    executor: E,
    /// Reports are only retained for one-shot runtimes; a watch session
    /// would otherwise accumulate one per rebuild for its whole lifetime.
    reports: Vec<RunReport>,
    finished_runs: usize,
}

impl<E: ExecutorBackend> fmt::Debug for Runtime<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("core", &self.core)
            .field("finished_runs", &self.finished_runs)
            .finish_non_exhaustive()
    }
}

impl<E: ExecutorBackend> Runtime<E> {
    pub fn new(core: CoreRuntime, event_rx: mpsc::Receiver<RuntimeEvent>, executor: E) -> Self {
        Self {
            core,
            event_rx,
            executor,
            reports: Vec::new(),
            finished_runs: 0,
        }
    }

    /// Main event loop.
    ///
    /// With `exit_when_idle`, returns the reports of every run that finished
    /// while the loop was alive, in completion order. Long-lived runtimes
    /// return an empty list.
    pub async fn run(mut self) -> Result<Vec<RunReport>> {
        info!("sitedag runtime started");

        loop {
            let Some(event) = self.event_rx.recv().await else {
                info!("runtime event channel closed; exiting");
                break;
            };

            debug!(?event, "runtime received event");

            let step = self.core.step(event);

            for command in step.commands {
                self.execute_command(command).await?;
            }

            if !step.keep_running {
                info!("core requested exit; stopping runtime");
                break;
            }
        }

        info!(runs = self.finished_runs, "runtime exiting");
        Ok(self.reports)
    }

    async fn execute_command(&mut self, command: CoreCommand) -> Result<()> {
        match command {
            CoreCommand::DispatchTasks(tasks) => self.spawn_ready(tasks).await?,
            CoreCommand::RunFinished(report) => self.report(report),
            CoreCommand::RequestExit => debug!("core issued RequestExit command"),
        }
        Ok(())
    }

    async fn spawn_ready(&mut self, tasks: Vec<ScheduledTask>) -> Result<()> {
        if tasks.is_empty() {
            return Ok(());
        }

        let names: Vec<_> = tasks.iter().map(|t| t.task.as_str()).collect();
        let run_ids: Vec<_> = tasks.iter().map(|t| t.run_id).collect();
        debug!(?names, ?run_ids, "spawning ready tasks");

        self.executor.spawn_ready_tasks(tasks).await
    }

    fn report(&mut self, report: RunReport) {
        if report.outcome.is_success() {
            info!(run_id = report.run_id, request = %report.request, "run succeeded");
        } else {
            warn!(run_id = report.run_id, request = %report.request, "run failed");
        }
        println!("[sitedag] {report}");
        self.finished_runs += 1;
        if self.core.options().exit_when_idle {
            self.reports.push(report);
        }
    }
}
