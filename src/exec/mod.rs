// src/exec/mod.rs

//! Task execution layer.
//!
//! This module runs scheduled tasks and reports back to the orchestration
//! runtime via `RuntimeEvent`s.
//!
//! - [`backend`] provides the `ExecutorBackend` trait and the
//!   `RealExecutorBackend` the runtime uses in production; tests replace it
//!   with a fake implementation.
//! - [`task_runner`] runs one scheduled task to completion.
//! - [`generator`] spawns the external site generator.

pub mod backend;
pub mod generator;
pub mod task_runner;

pub use backend::{ExecutorBackend, RealExecutorBackend, TaskContext};
pub use generator::run_generator;
