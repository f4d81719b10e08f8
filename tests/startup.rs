// tests/startup.rs

use clap::Parser;

use sitedag::cli::CliArgs;
use sitedag::errors::SiteError;
use sitedag::types::AssetClass;
use sitedag_test_utils::{init_tracing, with_timeout};

const MISSING_COMPILER_CONFIG: &str = r#"
[styles]
compilers = [
  { program = "sitedag-missing-sass", args = ["{input}"] },
  { program = "sitedag-missing-sassc", args = ["{input}"] },
]

[generator]
program = "sh"
args = ["-c", "touch generator-ran"]
"#;

fn project_without_style_compiler() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("Sitedag.toml"), MISSING_COMPILER_CONFIG).unwrap();
    std::fs::create_dir_all(dir.path().join("src/fonts")).unwrap();
    std::fs::write(dir.path().join("src/fonts/a.woff"), b"font").unwrap();
    dir
}

fn args(dir: &tempfile::TempDir, rest: &[&str]) -> CliArgs {
    let root = dir.path().to_string_lossy().to_string();
    let mut argv = vec!["sitedag".to_string(), "--root".to_string(), root];
    argv.extend(rest.iter().map(|s| s.to_string()));
    CliArgs::try_parse_from(argv).unwrap()
}

fn assert_missing_styles(err: anyhow::Error) {
    match err.downcast_ref::<SiteError>() {
        Some(SiteError::MissingDependency { class, tried }) => {
            assert_eq!(*class, AssetClass::Styles);
            assert_eq!(tried.len(), 2);
        }
        other => panic!("expected MissingDependency, got {other:?}"),
    }
}

#[tokio::test]
async fn missing_style_compiler_aborts_build_before_any_task() {
    init_tracing();
    let dir = project_without_style_compiler();

    let err = with_timeout(sitedag::run(args(&dir, &["build"])))
        .await
        .unwrap_err();
    assert_missing_styles(err);

    assert!(!dir.path().join("assets").exists(), "a transform ran");
    assert!(!dir.path().join("generator-ran").exists(), "the generator ran");
}

#[tokio::test]
async fn missing_style_compiler_aborts_dev_before_watching() {
    init_tracing();
    let dir = project_without_style_compiler();

    // Returning at all proves no watcher or preview server was started:
    // `dev` only returns on Ctrl-C otherwise.
    let err = with_timeout(sitedag::run(args(&dir, &["dev", "--port", "0"])))
        .await
        .unwrap_err();
    assert_missing_styles(err);
    assert!(!dir.path().join("assets").exists());
}

#[tokio::test]
async fn dry_run_resolves_nothing_and_runs_nothing() {
    init_tracing();
    let dir = project_without_style_compiler();

    let code = with_timeout(sitedag::run(args(&dir, &["--dry-run", "build"])))
        .await
        .unwrap();
    assert_eq!(code, 0);
    assert!(!dir.path().join("assets").exists());
    assert!(!dir.path().join("generator-ran").exists());
}
