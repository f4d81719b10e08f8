// src/errors.rs

//! Crate-wide error type and helpers.

use thiserror::Error;

use crate::types::AssetClass;

#[derive(Error, Debug)]
pub enum SiteError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Invalid glob pattern: {0}")]
    GlobError(#[from] globset::Error),

    #[error("Missing dependency for {class}: none of [{}] found on PATH", tried.join(", "))]
    MissingDependency {
        class: AssetClass,
        tried: Vec<String>,
    },

    #[error("Tool '{tool}' failed on {input} (exit code {code}): {stderr}")]
    ToolFailed {
        tool: String,
        input: String,
        code: i32,
        stderr: String,
    },

    #[error("Generator process exited with code {0}")]
    GeneratorFailed(i32),

    #[error("Cycle detected in task graph: {0}")]
    DagCycle(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SiteError {
    /// Exit code carried by this error, used for task outcomes.
    ///
    /// Subprocess failures carry the subprocess's code; everything else is -1.
    pub fn task_code(&self) -> i32 {
        match self {
            SiteError::ToolFailed { code, .. } => *code,
            SiteError::GeneratorFailed(code) => *code,
            _ => -1,
        }
    }
}

/// Map a task/subprocess code onto a valid process exit code.
pub fn process_exit_code(code: i32) -> i32 {
    if (1..=255).contains(&code) { code } else { 1 }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, SiteError>;
