// src/config/validate.rs

use std::path::{Component, Path};

use crate::config::model::{ConfigFile, RawConfigFile, ToolSpec};
use crate::errors::{Result, SiteError};
use crate::types::AssetClass;
use crate::watch::patterns::build_globset;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = SiteError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_patterns(cfg)?;
    validate_output_dirs(cfg)?;
    validate_tools(cfg)?;
    validate_generator(cfg)?;
    Ok(())
}

fn validate_patterns(cfg: &RawConfigFile) -> Result<()> {
    for class in AssetClass::ALL {
        let pattern = cfg.paths.pattern(class);
        if pattern.trim().is_empty() {
            return Err(SiteError::ConfigError(format!(
                "[paths].{class} must not be empty"
            )));
        }
        build_globset(&[pattern.to_string()]).map_err(|e| {
            SiteError::ConfigError(format!("[paths].{class}: {e:#}"))
        })?;
    }

    build_globset(&cfg.paths.templates)
        .map_err(|e| SiteError::ConfigError(format!("[paths].templates: {e:#}")))?;

    Ok(())
}

/// Output directories must be relative, non-empty and pairwise disjoint:
/// transforms run in parallel and the generator rewrites the site dir.
fn validate_output_dirs(cfg: &RawConfigFile) -> Result<()> {
    let mut dirs: Vec<(&str, &Path)> = AssetClass::ALL
        .iter()
        .map(|class| (class.as_str(), cfg.output.dir(*class)))
        .collect();
    dirs.push(("site", cfg.output.site.as_path()));

    for (name, dir) in dirs.iter() {
        if dir.as_os_str().is_empty() {
            return Err(SiteError::ConfigError(format!(
                "[output].{name} must not be empty"
            )));
        }
        if dir.is_absolute()
            || dir
                .components()
                .any(|c| matches!(c, Component::ParentDir | Component::Prefix(_)))
        {
            return Err(SiteError::ConfigError(format!(
                "[output].{name} must be a relative path inside the project (got {dir:?})"
            )));
        }
    }

    for (i, (name_a, a)) in dirs.iter().enumerate() {
        for (name_b, b) in dirs.iter().skip(i + 1) {
            if a.starts_with(b) || b.starts_with(a) {
                return Err(SiteError::ConfigError(format!(
                    "[output].{name_a} ({a:?}) and [output].{name_b} ({b:?}) overlap; \
                     output directories must be disjoint"
                )));
            }
        }
    }

    Ok(())
}

fn validate_tools(cfg: &RawConfigFile) -> Result<()> {
    if cfg.styles.compilers.is_empty() {
        return Err(SiteError::ConfigError(
            "[styles].compilers must list at least one compiler".to_string(),
        ));
    }
    validate_tool_list("[styles].compilers", &cfg.styles.compilers)?;
    validate_tool_list("[scripts].minifiers", &cfg.scripts.minifiers)?;

    let bundle = cfg.scripts.bundle.trim();
    if bundle.is_empty() || bundle.contains('/') || bundle.contains('\\') {
        return Err(SiteError::ConfigError(format!(
            "[scripts].bundle must be a plain file name (got {:?})",
            cfg.scripts.bundle
        )));
    }

    for (ext, tools) in cfg.images.optimizers.iter() {
        if ext.is_empty() || ext.starts_with('.') || ext.to_lowercase() != *ext {
            return Err(SiteError::ConfigError(format!(
                "[images.optimizers] keys must be lowercase extensions without a dot (got {ext:?})"
            )));
        }
        validate_tool_list(&format!("[images.optimizers].{ext}"), tools)?;
    }

    Ok(())
}

fn validate_tool_list(section: &str, tools: &[ToolSpec]) -> Result<()> {
    for tool in tools {
        if tool.program.trim().is_empty() {
            return Err(SiteError::ConfigError(format!(
                "{section}: tool program must not be empty"
            )));
        }
    }
    Ok(())
}

fn validate_generator(cfg: &RawConfigFile) -> Result<()> {
    if cfg.generator.program.trim().is_empty() {
        return Err(SiteError::ConfigError(
            "[generator].program must not be empty".to_string(),
        ));
    }
    Ok(())
}
