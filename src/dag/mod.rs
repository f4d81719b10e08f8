// src/dag/mod.rs

//! Task graph representation and scheduling.
//!
//! - [`graph`] holds the static site task graph and computes run plans.
//! - [`run`] tracks one run's per-task state and its final outcome.
//! - [`scheduler`] owns all in-flight runs and decides what is ready.
//! - [`task_info`] provides run state and scheduled task types.
//! - [`scheduler_step`] defines the result type for scheduler steps.

pub mod graph;
pub mod run;
pub mod scheduler;
pub mod scheduler_step;
pub mod task_info;

pub use graph::{RunRequest, TaskGraph};
pub use run::{RunOutcome, RunReport};
pub use scheduler::Scheduler;
pub use scheduler_step::SchedulerStep;
pub use task_info::{RunId, ScheduledTask, TaskRunState};
