// src/engine/mod.rs

//! Orchestration engine for sitedag.
//!
//! This module ties together:
//! - the run scheduler
//! - the main runtime event loop that reacts to:
//!   - run requests (startup commands and file-watch bindings)
//!   - task completion events
//!   - shutdown signals
//!
//! The pure core state machine lives in [`core`]; the async/IO shell is
//! implemented in [`runtime`].

use crate::dag::{RunId, RunRequest};
use crate::types::TaskId;

/// Outcome of a task for the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    Success,
    Failed(i32),
}

/// Why a run was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerReason {
    /// Requested by the CLI command (initial build, one-shot tasks).
    Manual,
    /// Requested by a watch binding.
    FileWatch,
}

/// Runtime options used by both the core and the async shell.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuntimeOptions {
    /// If true, exit the runtime once no run is in flight (one-shot commands
    /// and the initial build of `dev`).
    pub exit_when_idle: bool,
}

/// Events flowing into the runtime from the CLI, watcher and executor.
#[derive(Debug, Clone)]
pub enum RuntimeEvent {
    /// Start a new run.
    RunRequested {
        request: RunRequest,
        reason: TriggerReason,
    },
    /// A task of a run finished with a concrete outcome.
    TaskCompleted {
        run_id: RunId,
        task: TaskId,
        outcome: TaskOutcome,
    },
    /// Graceful shutdown requested (e.g. Ctrl-C).
    ShutdownRequested,
}

pub mod core;
pub mod event_handlers;
pub mod runtime;

pub use core::CoreRuntime;
pub use event_handlers::{CoreCommand, CoreStep};
pub use runtime::Runtime;
