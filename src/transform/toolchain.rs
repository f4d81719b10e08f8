// src/transform/toolchain.rs

//! One-shot resolution of every external transform tool.
//!
//! Runs once at process start, before any task or watch binding exists.
//! Either every required tool resolves to a concrete executable, or startup
//! fails with [`SiteError::MissingDependency`].

use std::collections::BTreeMap;
use std::path::PathBuf;

use tracing::info;

use crate::config::model::ConfigFile;
use crate::errors::{Result, SiteError};
use crate::transform::tool::{find_on_path, resolve_first, ResolvedTool};
use crate::types::AssetClass;

#[derive(Debug, Clone)]
pub struct Toolchain {
    style_compiler: ResolvedTool,
    script_minifier: Option<ResolvedTool>,
    image_optimizers: BTreeMap<String, ResolvedTool>,
}

impl Toolchain {
    /// Resolve tools against the real `PATH`.
    pub fn resolve(cfg: &ConfigFile) -> Result<Self> {
        Self::resolve_with(cfg, find_on_path)
    }

    /// Resolve tools with a custom lookup (used by tests).
    pub fn resolve_with<F>(cfg: &ConfigFile, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<PathBuf>,
    {
        let compilers = &cfg.styles().compilers;
        let style_compiler = resolve_first(compilers, &lookup).ok_or_else(|| {
            SiteError::MissingDependency {
                class: AssetClass::Styles,
                tried: compilers.iter().map(|t| t.program.clone()).collect(),
            }
        })?;
        info!(tool = %style_compiler.name(), path = ?style_compiler.program(), "style compiler resolved");

        let minifiers = &cfg.scripts().minifiers;
        let script_minifier = if minifiers.is_empty() {
            info!("no script minifiers configured; bundles are concatenated only");
            None
        } else {
            let tool = resolve_first(minifiers, &lookup).ok_or_else(|| {
                SiteError::MissingDependency {
                    class: AssetClass::Scripts,
                    tried: minifiers.iter().map(|t| t.program.clone()).collect(),
                }
            })?;
            info!(tool = %tool.name(), path = ?tool.program(), "script minifier resolved");
            Some(tool)
        };

        let mut image_optimizers = BTreeMap::new();
        for (ext, candidates) in cfg.images().optimizers.iter() {
            if candidates.is_empty() {
                continue;
            }
            let tool = resolve_first(candidates, &lookup).ok_or_else(|| {
                SiteError::MissingDependency {
                    class: AssetClass::Images,
                    tried: candidates.iter().map(|t| t.program.clone()).collect(),
                }
            })?;
            info!(ext = %ext, tool = %tool.name(), "image optimizer resolved");
            image_optimizers.insert(ext.clone(), tool);
        }

        Ok(Self {
            style_compiler,
            script_minifier,
            image_optimizers,
        })
    }

    pub fn style_compiler(&self) -> &ResolvedTool {
        &self.style_compiler
    }

    pub fn script_minifier(&self) -> Option<&ResolvedTool> {
        self.script_minifier.as_ref()
    }

    pub fn image_optimizers(&self) -> &BTreeMap<String, ResolvedTool> {
        &self.image_optimizers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::model::RawConfigFile;

    fn lookup_only(available: &'static [&'static str]) -> impl Fn(&str) -> Option<PathBuf> {
        move |program| {
            available
                .contains(&program)
                .then(|| PathBuf::from(format!("/opt/bin/{program}")))
        }
    }

    #[test]
    fn falls_back_to_second_style_compiler() {
        let cfg = ConfigFile::default();
        let chain = Toolchain::resolve_with(
            &cfg,
            lookup_only(&["sassc", "terser", "jpegtran", "oxipng", "gifsicle"]),
        )
        .unwrap();

        assert_eq!(chain.style_compiler().name(), "sassc");
        assert_eq!(chain.script_minifier().unwrap().name(), "terser");
        assert_eq!(chain.image_optimizers().len(), 3);
    }

    #[test]
    fn missing_style_compiler_is_fatal() {
        let cfg = ConfigFile::default();
        let err = Toolchain::resolve_with(&cfg, lookup_only(&["uglifyjs"])).unwrap_err();

        match err {
            SiteError::MissingDependency { class, tried } => {
                assert_eq!(class, AssetClass::Styles);
                assert_eq!(tried, vec!["sass".to_string(), "sassc".to_string()]);
            }
            other => panic!("expected MissingDependency, got {other:?}"),
        }
    }

    #[test]
    fn empty_minifier_and_optimizer_lists_are_optional() {
        let mut raw = RawConfigFile::default();
        raw.scripts.minifiers.clear();
        raw.images.optimizers.clear();
        let cfg = ConfigFile::try_from(raw).unwrap();

        let chain = Toolchain::resolve_with(&cfg, lookup_only(&["sass"])).unwrap();
        assert!(chain.script_minifier().is_none());
        assert!(chain.image_optimizers().is_empty());
    }
}
