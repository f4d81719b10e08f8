// src/lib.rs

pub mod cli;
pub mod config;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod serve;
pub mod transform;
pub mod types;
pub mod watch;

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::cli::{CliArgs, Command};
use crate::config::load_for_project;
use crate::config::model::{ConfigFile, ToolSpec};
use crate::dag::{RunReport, RunRequest, Scheduler, TaskGraph};
use crate::engine::{CoreRuntime, Runtime, RuntimeEvent, RuntimeOptions, TriggerReason};
use crate::errors::process_exit_code;
use crate::exec::{RealExecutorBackend, TaskContext};
use crate::serve::{LiveReload, PreviewHandle, PreviewServer, ReloadNotifier};
use crate::transform::tool::find_on_path;
use crate::transform::{Pipeline, Toolchain};
use crate::types::AssetClass;
use crate::watch::{build_watch_bindings, spawn_watcher, WatcherHandle};

/// High-level entry point used by `main.rs`. Returns the process exit code.
///
/// This wires together:
/// - config loading
/// - tool resolution (fatal before anything runs)
/// - scheduler / runtime / executor
/// - for `dev`: preview server, file watcher and Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<i32> {
    let root = args.root.clone();
    let command = args.command.unwrap_or_default();

    let mut cfg = load_for_project(&root, args.config.as_deref())?;
    if let Command::Dev { port: Some(port) } = command {
        cfg = cfg.with_serve_port(port);
    }

    let graph = TaskGraph::site();
    graph.topological_order()?;

    if args.dry_run {
        print_dry_run(&root, &cfg, &graph)?;
        return Ok(0);
    }

    let toolchain = Toolchain::resolve(&cfg)?;
    let pipeline = Arc::new(Pipeline::new(root, cfg, &toolchain));
    let hub = Arc::new(LiveReload::new());
    let notifier: Arc<dyn ReloadNotifier> = hub.clone();
    let ctx = Arc::new(TaskContext::new(Arc::clone(&pipeline), notifier));

    match command.request() {
        Some(request) => {
            let reports = run_once(Arc::clone(&ctx), graph, request).await?;
            Ok(exit_code_for(&reports))
        }
        None => run_dev(ctx, graph, hub).await,
    }
}

/// Run a single request to completion and return its report(s).
pub async fn run_once(
    ctx: Arc<TaskContext>,
    graph: TaskGraph,
    request: RunRequest,
) -> Result<Vec<RunReport>> {
    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(64);
    rt_tx
        .send(RuntimeEvent::RunRequested {
            request,
            reason: TriggerReason::Manual,
        })
        .await?;

    let core = CoreRuntime::new(
        Scheduler::new(graph),
        RuntimeOptions {
            exit_when_idle: true,
        },
    );
    let executor = RealExecutorBackend::new(ctx, rt_tx);
    Ok(Runtime::new(core, rt_rx, executor).run().await?)
}

/// `dev`: full build, then preview server + watcher until Ctrl-C.
async fn run_dev(ctx: Arc<TaskContext>, graph: TaskGraph, hub: Arc<LiveReload>) -> Result<i32> {
    let session = DevSession::start(ctx, graph, hub).await?;
    println!("[sitedag] serving {}", session.url());

    // Ctrl-C -> graceful shutdown.
    let tx = session.event_sender();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            eprintln!("failed to listen for Ctrl+C: {e}");
            return;
        }
        let _ = tx.send(RuntimeEvent::ShutdownRequested).await;
    });

    session.run().await?;
    Ok(0)
}

/// A running `dev` session: the initial build has finished, the preview
/// server is listening and the watcher is registered.
///
/// [`DevSession::run`] drives rebuilds until a `ShutdownRequested` event
/// arrives on [`DevSession::event_sender`].
pub struct DevSession {
    preview: PreviewHandle,
    runtime: Runtime<RealExecutorBackend>,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
    _watcher: WatcherHandle,
}

impl std::fmt::Debug for DevSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DevSession")
            .field("preview", &self.preview)
            .finish_non_exhaustive()
    }
}

impl DevSession {
    /// Run the full build, then start the preview server and the watcher.
    ///
    /// A failed initial build is logged and the session starts anyway, so
    /// the next change can repair the site.
    pub async fn start(
        ctx: Arc<TaskContext>,
        graph: TaskGraph,
        hub: Arc<LiveReload>,
    ) -> Result<Self> {
        let pipeline = Arc::clone(&ctx.pipeline);
        let cfg = pipeline.config();

        let reports = run_once(Arc::clone(&ctx), graph.clone(), RunRequest::FullBuild).await?;
        if exit_code_for(&reports) != 0 {
            warn!("initial build failed; serving existing output and watching for changes");
        }

        let site_dir = pipeline.root().join(&cfg.output().site);
        let preview = PreviewServer::new(site_dir, hub)
            .start(&cfg.serve().addr_string())
            .await?;

        let (runtime_tx, runtime_rx) = mpsc::channel::<RuntimeEvent>(256);

        let bindings = build_watch_bindings(cfg)?;
        let watcher = spawn_watcher(pipeline.root(), bindings, runtime_tx.clone())?;

        let core = CoreRuntime::new(Scheduler::new(graph), RuntimeOptions::default());
        let executor = RealExecutorBackend::new(ctx, runtime_tx.clone());

        Ok(Self {
            preview,
            runtime: Runtime::new(core, runtime_rx, executor),
            runtime_tx,
            _watcher: watcher,
        })
    }

    pub fn url(&self) -> String {
        self.preview.url()
    }

    pub fn preview_addr(&self) -> SocketAddr {
        self.preview.addr()
    }

    /// Channel into the watch runtime.
    pub fn event_sender(&self) -> mpsc::Sender<RuntimeEvent> {
        self.runtime_tx.clone()
    }

    /// Serve and rebuild until shutdown, then stop the preview server.
    pub async fn run(self) -> Result<()> {
        let Self {
            preview,
            runtime,
            _watcher: watcher,
            ..
        } = self;

        let result = runtime.run().await;
        drop(watcher);
        preview.shutdown().await;
        result?;
        info!("watch session ended");
        Ok(())
    }
}

/// Process exit code for a set of finished runs: 0 if all succeeded,
/// otherwise derived from the first failure.
pub fn exit_code_for(reports: &[RunReport]) -> i32 {
    reports
        .iter()
        .find_map(|r| match r.outcome {
            dag::RunOutcome::Succeeded => None,
            dag::RunOutcome::Failed { code, .. } => Some(process_exit_code(code)),
        })
        .unwrap_or(0)
}

/// Dry-run output: configuration, tool lookup, task graph and bindings.
fn print_dry_run(root: &Path, cfg: &ConfigFile, graph: &TaskGraph) -> Result<()> {
    println!("sitedag dry-run");
    println!("  root = {}", root.display());
    println!();

    println!("asset classes:");
    for class in AssetClass::ALL {
        println!(
            "  - {class}: {} -> {}",
            cfg.paths().pattern(class),
            cfg.output().dir(class).display()
        );
    }
    println!("  site output: {}", cfg.output().site.display());
    println!();

    println!("tools:");
    print_candidates("styles", &cfg.styles().compilers);
    print_candidates("scripts", &cfg.scripts().minifiers);
    for (ext, candidates) in cfg.images().optimizers.iter() {
        print_candidates(&format!("images .{ext}"), candidates);
    }
    println!(
        "  generator: {} {}",
        cfg.generator().program,
        cfg.generator().args.join(" ")
    );
    println!("  serve: http://{}/", cfg.serve().addr_string());
    println!();

    println!("tasks (topological order):");
    for task in graph.topological_order()? {
        let deps = graph.dependencies_of(task);
        if deps.is_empty() {
            println!("  - {task}");
        } else {
            let deps: Vec<&str> = deps.iter().map(|d| d.as_str()).collect();
            println!("  - {task} (after: {})", deps.join(", "));
        }
    }
    println!();

    println!("watch bindings:");
    for binding in build_watch_bindings(cfg)? {
        println!(
            "  - {} -> {}: {:?}",
            binding.name(),
            binding.entry(),
            binding.patterns()
        );
    }

    debug!("dry-run complete (no execution)");
    Ok(())
}

fn print_candidates(label: &str, candidates: &[ToolSpec]) {
    if candidates.is_empty() {
        println!("  {label}: (none configured)");
        return;
    }
    for spec in candidates {
        match find_on_path(&spec.program) {
            Some(path) => println!("  {label}: {} [{}]", spec.program, path.display()),
            None => println!("  {label}: {} [not found]", spec.program),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dag::RunOutcome;
    use crate::types::TaskId;

    fn report(run_id: u64, outcome: RunOutcome) -> RunReport {
        RunReport {
            run_id,
            request: RunRequest::FullBuild,
            outcome,
        }
    }

    #[test]
    fn exit_code_uses_first_failure() {
        assert_eq!(exit_code_for(&[]), 0);
        assert_eq!(exit_code_for(&[report(1, RunOutcome::Succeeded)]), 0);
        assert_eq!(
            exit_code_for(&[
                report(1, RunOutcome::Succeeded),
                report(
                    2,
                    RunOutcome::Failed {
                        task: TaskId::Generate,
                        code: 16
                    }
                ),
            ]),
            16
        );
        assert_eq!(
            exit_code_for(&[report(
                1,
                RunOutcome::Failed {
                    task: TaskId::Styles,
                    code: -1
                }
            )]),
            1
        );
    }
}
