// tests/config_loading.rs

use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;

use sitedag::config::{load_for_project, ConfigFile, DEFAULT_CONFIG_FILE};
use sitedag::errors::SiteError;
use sitedag::types::AssetClass;
use sitedag_test_utils::builders::ConfigFileBuilder;

#[test]
fn missing_project_file_falls_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = load_for_project(dir.path(), None).unwrap();

    assert_eq!(cfg.paths().pattern(AssetClass::Styles), "src/styles/**/*.scss");
    assert_eq!(cfg.output().dir(AssetClass::Scripts), Path::new("assets/js"));
    assert_eq!(cfg.serve().addr_string(), "127.0.0.1:3000");
    assert_eq!(cfg.scripts().bundle, "main.js");
}

#[test]
fn project_file_overrides_only_what_it_names() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join(DEFAULT_CONFIG_FILE),
        r#"
[paths]
scripts = "js/*.js"

[output]
scripts = "static/js"

[serve]
port = 4000
"#,
    )
    .unwrap();

    let cfg = load_for_project(dir.path(), None).unwrap();
    assert_eq!(cfg.paths().pattern(AssetClass::Scripts), "js/*.js");
    assert_eq!(cfg.output().dir(AssetClass::Scripts), Path::new("static/js"));
    assert_eq!(cfg.serve().port, 4000);
    assert_eq!(cfg.output().dir(AssetClass::Styles), Path::new("assets/css"));
}

#[test]
fn explicit_config_must_exist() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.toml");

    match load_for_project(dir.path(), Some(&missing)) {
        Err(SiteError::IoError(_)) => {}
        other => panic!("expected IoError, got {other:?}"),
    }
}

#[test]
fn nested_output_directories_are_rejected() -> Result<(), Box<dyn std::error::Error>> {
    let mut file = NamedTempFile::new()?;
    writeln!(
        file,
        r#"
[output]
images = "assets/css/img"
"#
    )?;

    match load_for_project(Path::new("."), Some(file.path())) {
        Err(SiteError::ConfigError(msg)) => assert!(msg.contains("disjoint"), "{msg}"),
        other => panic!("expected ConfigError, got {other:?}"),
    }
    Ok(())
}

#[test]
fn malformed_toml_is_a_toml_error() -> Result<(), Box<dyn std::error::Error>> {
    let mut file = NamedTempFile::new()?;
    writeln!(file, "[serve\nport = ")?;

    assert!(matches!(
        load_for_project(Path::new("."), Some(file.path())),
        Err(SiteError::TomlError(_))
    ));
    Ok(())
}

#[test]
fn builder_produces_validated_config() {
    let raw = ConfigFileBuilder::new()
        .output(AssetClass::Fonts, "_site/fonts")
        .raw();
    assert!(ConfigFile::try_from(raw).is_err());

    let cfg = ConfigFileBuilder::new()
        .pattern(AssetClass::Images, "media/**/*.png")
        .build();
    assert_eq!(cfg.paths().pattern(AssetClass::Images), "media/**/*.png");
}
