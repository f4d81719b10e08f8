// src/transform/tool.rs

//! External tool lookup and invocation.
//!
//! Tools are plain subprocesses: input is either a path argument (`{input}`)
//! or stdin, and the result is whatever the tool writes to stdout.

use std::env;
use std::ffi::OsString;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;

use anyhow::{anyhow, Context};
use tracing::{debug, warn};

use crate::config::model::ToolSpec;
use crate::errors::{Result, SiteError};

/// A tool whose program was found on disk at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTool {
    spec: ToolSpec,
    program: PathBuf,
}

impl ResolvedTool {
    pub fn new(spec: ToolSpec, program: PathBuf) -> Self {
        Self { spec, program }
    }

    /// Program name as configured (e.g. `sass`).
    pub fn name(&self) -> &str {
        &self.spec.program
    }

    /// Full path of the executable that will be spawned.
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Run the tool on a file and return its stdout.
    ///
    /// If the configured args have no `{input}` placeholder, the file's
    /// contents are piped to stdin instead.
    pub fn run_on_file(&self, input: &Path) -> Result<Vec<u8>> {
        if self.spec.takes_input_arg() {
            let input_str = input.to_string_lossy();
            let args: Vec<String> = self
                .spec
                .args
                .iter()
                .map(|a| a.replace(ToolSpec::INPUT_PLACEHOLDER, &input_str))
                .collect();
            self.execute(&args, None, &input_str)
        } else {
            let bytes = std::fs::read(input)
                .with_context(|| format!("reading tool input {:?}", input))?;
            self.execute(&self.spec.args, Some(bytes), &input.to_string_lossy())
        }
    }

    /// Run the tool with `contents` on stdin and return its stdout.
    ///
    /// `label` names the input in error messages.
    pub fn run_with_stdin(&self, contents: Vec<u8>, label: &str) -> Result<Vec<u8>> {
        self.execute(&self.spec.args, Some(contents), label)
    }

    fn execute(&self, args: &[String], stdin: Option<Vec<u8>>, label: &str) -> Result<Vec<u8>> {
        debug!(tool = %self.name(), input = %label, ?args, "running tool");

        let mut cmd = Command::new(&self.program);
        cmd.args(args)
            .stdin(if stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = cmd
            .spawn()
            .with_context(|| format!("spawning tool '{}' ({:?})", self.name(), self.program))?;

        // Feed stdin from a separate thread so a tool that streams output
        // while reading cannot deadlock on a full pipe.
        let writer = match (stdin, child.stdin.take()) {
            (Some(bytes), Some(mut pipe)) => {
                Some(thread::spawn(move || pipe.write_all(&bytes)))
            }
            _ => None,
        };

        let output = child
            .wait_with_output()
            .with_context(|| format!("waiting for tool '{}'", self.name()))?;

        let written = writer.map(|w| w.join());

        if output.status.success() {
            check_stdin_write(self.name(), label, written)?;
            Ok(output.stdout)
        } else {
            Err(SiteError::ToolFailed {
                tool: self.name().to_string(),
                input: label.to_string(),
                code: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            })
        }
    }
}

/// Outcome of feeding stdin to a tool that exited successfully.
///
/// A tool that closed its stdin early (broken pipe) is trusted with a
/// warning; any other write error fails the tool.
fn check_stdin_write(
    tool: &str,
    label: &str,
    written: Option<thread::Result<io::Result<()>>>,
) -> Result<()> {
    match written {
        None | Some(Ok(Ok(()))) => Ok(()),
        Some(Ok(Err(err))) if err.kind() == io::ErrorKind::BrokenPipe => {
            warn!(tool, input = %label, "tool exited before reading all of its input");
            Ok(())
        }
        Some(Ok(Err(err))) => Err(anyhow::Error::new(err)
            .context(format!("writing {label} to tool '{tool}'"))
            .into()),
        Some(Err(_)) => Err(anyhow!("stdin writer for tool '{tool}' panicked").into()),
    }
}

/// Resolve the first candidate whose program can be found, using `lookup`.
pub fn resolve_first<F>(candidates: &[ToolSpec], lookup: F) -> Option<ResolvedTool>
where
    F: Fn(&str) -> Option<PathBuf>,
{
    candidates.iter().find_map(|spec| {
        let found = lookup(&spec.program);
        debug!(tool = %spec.program, found = ?found, "tool lookup");
        found.map(|path| ResolvedTool::new(spec.clone(), path))
    })
}

/// Locate an executable the way a shell would.
///
/// Programs containing a path separator are checked as-is; bare names are
/// searched in `PATH` (with `PATHEXT` suffixes on Windows).
pub fn find_on_path(program: &str) -> Option<PathBuf> {
    let candidate = Path::new(program);
    if candidate.components().count() > 1 {
        return is_executable(candidate).then(|| candidate.to_path_buf());
    }

    let path_var = env::var_os("PATH")?;
    let suffixes = executable_suffixes();

    for dir in env::split_paths(&path_var) {
        for suffix in &suffixes {
            let mut name = OsString::from(program);
            name.push(suffix);
            let full = dir.join(&name);
            if is_executable(&full) {
                return Some(full);
            }
        }
    }

    None
}

fn executable_suffixes() -> Vec<OsString> {
    let mut suffixes = vec![OsString::new()];
    if cfg!(windows) {
        let pathext = env::var("PATHEXT").unwrap_or_else(|_| ".EXE;.CMD;.BAT;.COM".to_string());
        suffixes.extend(
            pathext
                .split(';')
                .filter(|s| !s.is_empty())
                .map(|s| OsString::from(s.to_lowercase())),
        );
    }
    suffixes
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_first_prefers_earlier_candidates() {
        let candidates = vec![
            ToolSpec::new("sass", &["{input}"]),
            ToolSpec::new("sassc", &["{input}"]),
        ];

        let both = resolve_first(&candidates, |p| Some(PathBuf::from(format!("/bin/{p}"))));
        assert_eq!(both.unwrap().name(), "sass");

        let fallback = resolve_first(&candidates, |p| {
            (p == "sassc").then(|| PathBuf::from("/usr/bin/sassc"))
        });
        let fallback = fallback.unwrap();
        assert_eq!(fallback.name(), "sassc");
        assert_eq!(fallback.program(), Path::new("/usr/bin/sassc"));

        assert!(resolve_first(&candidates, |_| None).is_none());
    }

    #[test]
    fn nonexistent_program_is_not_found() {
        assert!(find_on_path("sitedag-definitely-missing-tool").is_none());
    }

    #[cfg(unix)]
    #[test]
    fn sh_is_found_on_path() {
        assert!(find_on_path("sh").is_some());
    }

    #[cfg(unix)]
    #[test]
    fn tool_reads_input_argument_and_stdin() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.txt");
        std::fs::write(&input, b"hello").unwrap();

        let cat_arg = ResolvedTool::new(
            ToolSpec::new("cat", &["{input}"]),
            find_on_path("cat").unwrap(),
        );
        assert_eq!(cat_arg.run_on_file(&input).unwrap(), b"hello");

        let cat_stdin = ResolvedTool::new(ToolSpec::new("cat", &[]), find_on_path("cat").unwrap());
        assert_eq!(cat_stdin.run_on_file(&input).unwrap(), b"hello");
        assert_eq!(
            cat_stdin.run_with_stdin(b"piped".to_vec(), "bundle").unwrap(),
            b"piped"
        );
    }

    #[test]
    fn stdin_write_errors_fail_the_tool_except_broken_pipe() {
        assert!(check_stdin_write("terser", "bundle", None).is_ok());
        assert!(check_stdin_write("terser", "bundle", Some(Ok(Ok(())))).is_ok());

        let broken = io::Error::from(io::ErrorKind::BrokenPipe);
        assert!(check_stdin_write("terser", "bundle", Some(Ok(Err(broken)))).is_ok());

        let other = io::Error::other("disk on fire");
        let err = check_stdin_write("terser", "bundle", Some(Ok(Err(other)))).unwrap_err();
        assert!(matches!(err, SiteError::Other(_)));
        assert!(format!("{err:#}").contains("terser"));
    }

    #[cfg(unix)]
    #[test]
    fn tool_ignoring_large_stdin_still_succeeds() {
        let tool = ResolvedTool::new(
            ToolSpec::new("sh", &["-c", "echo done"]),
            find_on_path("sh").unwrap(),
        );
        let out = tool.run_with_stdin(vec![b'x'; 1 << 20], "bundle").unwrap();
        assert_eq!(out, b"done\n");
    }

    #[cfg(unix)]
    #[test]
    fn failing_tool_reports_exit_code_and_stderr() {
        let tool = ResolvedTool::new(
            ToolSpec::new("sh", &["-c", "echo broken >&2; exit 4", "{input}"]),
            find_on_path("sh").unwrap(),
        );

        match tool.run_on_file(Path::new("whatever.scss")) {
            Err(SiteError::ToolFailed { code, stderr, .. }) => {
                assert_eq!(code, 4);
                assert_eq!(stderr, "broken");
            }
            other => panic!("expected ToolFailed, got {other:?}"),
        }
    }
}
