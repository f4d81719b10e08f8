// src/exec/generator.rs

//! External site generator invocation.

use std::path::Path;
use std::process::Stdio;

use tokio::process::Command;
use tracing::{error, info};

use crate::config::model::GeneratorSection;
use crate::errors::{Result, SiteError};

/// Run the generator in `root` with inherited stdio and wait for it to exit.
///
/// Exit code 0 is success. Any other code is `GeneratorFailed(code)`; a
/// generator that cannot be spawned or is killed by a signal fails with -1.
pub async fn run_generator(root: &Path, generator: &GeneratorSection) -> Result<()> {
    info!(program = %generator.program, args = ?generator.args, "running site generator");

    let status = Command::new(&generator.program)
        .args(&generator.args)
        .current_dir(root)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .await;

    match status {
        Ok(status) if status.success() => Ok(()),
        Ok(status) => Err(SiteError::GeneratorFailed(status.code().unwrap_or(-1))),
        Err(err) => {
            error!(program = %generator.program, "failed to spawn site generator: {err}");
            Err(SiteError::GeneratorFailed(-1))
        }
    }
}
