// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::Result;

/// Default config file name, looked up in the project root.
pub const DEFAULT_CONFIG_FILE: &str = "Sitedag.toml";

/// Load a configuration file from a given path and return the raw `RawConfigFile`.
///
/// This only performs TOML deserialization; it does **not** perform semantic
/// validation. Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawConfigFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Load a configuration file from path and validate it.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let raw_config = load_from_path(&path)?;
    let config = ConfigFile::try_from(raw_config)?;
    Ok(config)
}

/// Resolve the configuration for a project.
///
/// - An explicit `--config` path must exist.
/// - Otherwise `Sitedag.toml` in `root` is used when present, and the
///   built-in defaults when it is not.
pub fn load_for_project(root: &Path, explicit: Option<&Path>) -> Result<ConfigFile> {
    if let Some(path) = explicit {
        debug!(?path, "loading explicit config file");
        return load_and_validate(path);
    }

    let path = default_config_path(root);
    if path.is_file() {
        debug!(?path, "loading project config file");
        load_and_validate(&path)
    } else {
        debug!(?path, "no config file found; using built-in defaults");
        Ok(ConfigFile::default())
    }
}

/// `Sitedag.toml` inside the given project root.
pub fn default_config_path(root: &Path) -> PathBuf {
    root.join(DEFAULT_CONFIG_FILE)
}
