// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::dag::RunRequest;
use crate::types::TaskId;

/// Command-line arguments for `sitedag`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "sitedag",
    version,
    about = "Build static-site assets, run the site generator and preview with live reload.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `Sitedag.toml` in the project root, if present.
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Project root; source patterns and output directories are relative to it.
    #[arg(long, value_name = "DIR", default_value = ".", global = true)]
    pub root: PathBuf,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `SITEDAG_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL", global = true)]
    pub log_level: Option<LogLevel>,

    /// Parse + validate, print the task graph and watch bindings, but don't
    /// run anything.
    #[arg(long, global = true)]
    pub dry_run: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Full build, then serve the site and rebuild on changes (default).
    Dev {
        /// Preview port (overrides `[serve].port`).
        #[arg(long)]
        port: Option<u16>,
    },
    /// All four asset transforms in parallel, then the site generator.
    Build,
    /// Compile stylesheets.
    Styles,
    /// Copy fonts.
    Fonts,
    /// Bundle and minify scripts.
    Scripts,
    /// Optimize images.
    Images,
    /// Run the site generator only.
    Generate,
}

impl Command {
    /// The run a one-shot command performs; `None` for `dev`.
    pub fn request(self) -> Option<RunRequest> {
        match self {
            Command::Dev { .. } => None,
            Command::Build => Some(RunRequest::FullBuild),
            Command::Styles => Some(RunRequest::Task(TaskId::Styles)),
            Command::Fonts => Some(RunRequest::Task(TaskId::Fonts)),
            Command::Scripts => Some(RunRequest::Task(TaskId::Scripts)),
            Command::Images => Some(RunRequest::Task(TaskId::Images)),
            Command::Generate => Some(RunRequest::Task(TaskId::Generate)),
        }
    }
}

impl Default for Command {
    fn default() -> Self {
        Command::Dev { port: None }
    }
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
