// src/config/mod.rs

//! Configuration loading and validation for sitedag.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk, falling back to defaults (`loader.rs`).
//! - Validate patterns, tool lists and output directory layout (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_and_validate, load_for_project, load_from_path, DEFAULT_CONFIG_FILE};
pub use model::{
    ConfigFile, GeneratorSection, ImagesSection, OutputSection, PathsSection, RawConfigFile,
    ScriptsSection, ServeSection, StylesSection, ToolSpec,
};
