// tests/pipeline_unix.rs
//
// Real subprocesses: `cat` stands in for the asset tools and `sh` for the
// site generator.

#![cfg(unix)]

use std::fs;
use std::path::Path;
use std::sync::Arc;

use sitedag::config::ConfigFile;
use sitedag::dag::{RunOutcome, RunRequest, TaskGraph};
use sitedag::exec::TaskContext;
use sitedag::serve::ReloadNotifier;
use sitedag::transform::{Pipeline, Toolchain};
use sitedag::types::{AssetClass, TaskId};
use sitedag::{exit_code_for, run_once};
use sitedag_test_utils::builders::posix_project_config;
use sitedag_test_utils::notifier::CountingNotifier;
use sitedag_test_utils::{init_tracing, with_timeout};

fn write(root: &Path, rel: &str, contents: &[u8]) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

fn fixture_project() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write(root, "src/styles/main.scss", b"body { color: red; }");
    write(root, "src/styles/_vars.scss", b"$x: 1;");
    write(root, "src/styles/pages/about.scss", b"h1 { margin: 0; }");
    write(root, "src/fonts/serif.woff2", b"\x00font");
    write(root, "src/js/b.js", b"two();");
    write(root, "src/js/a.js", b"one();");
    write(root, "src/img/logo.png", b"\x89PNG");
    write(root, "index.html", b"<html><body>hi</body></html>");
    dir
}

fn pipeline(root: &Path, cfg: ConfigFile) -> Arc<Pipeline> {
    let toolchain = Toolchain::resolve(&cfg).unwrap();
    Arc::new(Pipeline::new(root, cfg, &toolchain))
}

#[test]
fn transforms_write_outputs_and_are_idempotent() {
    init_tracing();
    let dir = fixture_project();
    let root = dir.path();
    let pipeline = pipeline(root, posix_project_config().build());

    for class in AssetClass::ALL {
        let out = pipeline.run_transform(class).unwrap();
        assert!(out.written_count() > 0, "{class} wrote nothing");
    }

    let read = |rel: &str| fs::read(root.join(rel)).unwrap();
    assert_eq!(read("assets/css/main.css"), b"body { color: red; }");
    assert_eq!(read("assets/css/pages/about.css"), b"h1 { margin: 0; }");
    assert!(!root.join("assets/css/_vars.css").exists(), "partials are not compiled");
    assert_eq!(read("assets/js/main.js"), b"one();\ntwo();");
    assert_eq!(read("assets/fonts/serif.woff2"), b"\x00font");
    assert_eq!(read("assets/img/logo.png"), b"\x89PNG");

    let before = read("assets/js/main.js");
    for class in AssetClass::ALL {
        let again = pipeline.run_transform(class).unwrap();
        assert_eq!(again.written_count(), 0, "{class} rewrote unchanged output");
    }
    assert_eq!(read("assets/js/main.js"), before);
}

#[test]
fn failing_tool_fails_only_its_transform() {
    init_tracing();
    let dir = fixture_project();
    let cfg = posix_project_config()
        .style_compilers(vec![sitedag::config::ToolSpec::new(
            "sh",
            &["-c", "echo 'syntax error' >&2; exit 65", "{input}"],
        )])
        .build();
    let pipeline = pipeline(dir.path(), cfg);

    let err = pipeline.run_transform(AssetClass::Styles).unwrap_err();
    assert_eq!(err.task_code(), 65);
    assert!(pipeline.run_transform(AssetClass::Fonts).is_ok());
}

#[tokio::test]
async fn full_build_then_rebuild_reloads_once() {
    init_tracing();
    let dir = fixture_project();
    let root = dir.path();
    let notifier = Arc::new(CountingNotifier::new());
    let shared: Arc<dyn ReloadNotifier> = notifier.clone();
    let ctx = Arc::new(TaskContext::new(
        pipeline(root, posix_project_config().build()),
        shared,
    ));

    let reports = with_timeout(run_once(Arc::clone(&ctx), TaskGraph::site(), RunRequest::FullBuild))
        .await
        .unwrap();
    assert_eq!(exit_code_for(&reports), 0);
    assert!(root.join("_site/index.html").is_file());
    assert_eq!(notifier.reloads(), 0, "a full build never reloads");

    write(root, "src/styles/main.scss", b"body { color: blue; }");
    let reports = with_timeout(run_once(
        Arc::clone(&ctx),
        TaskGraph::site(),
        RunRequest::Rebuild(TaskId::Styles),
    ))
    .await
    .unwrap();

    assert_eq!(reports[0].outcome, RunOutcome::Succeeded);
    assert_eq!(notifier.reloads(), 1);
    assert!(
        notifier
            .streamed()
            .iter()
            .any(|f| f.written && f.path == Path::new("assets/css/main.css"))
    );
}

#[tokio::test]
async fn generator_exit_code_becomes_process_exit_code() {
    init_tracing();
    let dir = fixture_project();
    let notifier = Arc::new(CountingNotifier::new());
    let shared: Arc<dyn ReloadNotifier> = notifier.clone();
    let cfg = posix_project_config().generator("sh", &["-c", "exit 3"]).build();
    let ctx = Arc::new(TaskContext::new(pipeline(dir.path(), cfg), shared));

    let reports = with_timeout(run_once(Arc::clone(&ctx), TaskGraph::site(), RunRequest::FullBuild))
        .await
        .unwrap();
    assert_eq!(
        reports[0].outcome,
        RunOutcome::Failed {
            task: TaskId::Generate,
            code: 3
        }
    );
    assert_eq!(exit_code_for(&reports), 3);

    let reports = with_timeout(run_once(ctx, TaskGraph::site(), RunRequest::Rebuild(TaskId::Generate)))
        .await
        .unwrap();
    assert!(!reports[0].outcome.is_success());
    assert_eq!(notifier.reloads(), 0);
}
