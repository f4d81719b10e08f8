// src/engine/core.rs

//! Pure core runtime state machine.
//!
//! This module contains a synchronous, deterministic "core runtime" that
//! consumes [`RuntimeEvent`]s and produces:
//! - an updated core state
//! - a list of "commands" describing what the IO shell should do next
//!
//! The async shell (`engine::runtime::Runtime`) is responsible for reading
//! events from channels, handing tasks to the executor and reporting
//! finished runs. The core is unit tested without Tokio, channels,
//! filesystem or processes.

use crate::dag::Scheduler;
use crate::engine::event_handlers::{handle_run_request, handle_task_completion, CoreStep};
use crate::engine::{RuntimeEvent, RuntimeOptions};

/// Pure core runtime state.
///
/// It has **no** channels, no Tokio types, and does not perform any IO.
#[derive(Debug)]
pub struct CoreRuntime {
    scheduler: Scheduler,
    options: RuntimeOptions,
}

impl CoreRuntime {
    pub fn new(scheduler: Scheduler, options: RuntimeOptions) -> Self {
        Self { scheduler, options }
    }

    pub fn options(&self) -> RuntimeOptions {
        self.options
    }

    pub fn is_idle(&self) -> bool {
        self.scheduler.is_idle()
    }

    /// Handle a single runtime event, updating core state and returning the
    /// resulting commands for the IO shell.
    pub fn step(&mut self, event: RuntimeEvent) -> CoreStep {
        match event {
            RuntimeEvent::RunRequested { request, reason } => {
                handle_run_request(&mut self.scheduler, &self.options, request, reason)
            }
            RuntimeEvent::TaskCompleted {
                run_id,
                task,
                outcome,
            } => handle_task_completion(&mut self.scheduler, &self.options, run_id, task, outcome),
            RuntimeEvent::ShutdownRequested => CoreStep {
                commands: Vec::new(),
                keep_running: false,
            },
        }
    }
}
