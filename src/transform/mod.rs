// src/transform/mod.rs

//! Transform tasks: one per asset class.
//!
//! Each transform reads the files matching its class pattern, hands them to
//! an external tool (or copies them), and writes results into its own
//! destination directory. Transforms are synchronous; the executor runs them
//! on the blocking pool.
//!
//! - [`toolchain`] resolves every external tool once at startup.
//! - [`tool`] spawns a resolved tool and captures its stdout.
//! - [`sources`] finds input files for a pattern.
//! - [`output`] writes results, skipping files whose bytes did not change.

pub mod fonts;
pub mod images;
pub mod output;
pub mod scripts;
pub mod sources;
pub mod styles;
pub mod tool;
pub mod toolchain;

use std::fmt;
use std::path::{Path, PathBuf};

use crate::config::model::ConfigFile;
use crate::errors::Result;
use crate::types::AssetClass;

pub use fonts::FontTransform;
pub use images::ImageTransform;
pub use output::ProducedFile;
pub use scripts::ScriptTransform;
pub use styles::StyleTransform;
pub use toolchain::Toolchain;

/// An idempotent asset transform.
pub trait Transform: Send + Sync + fmt::Debug {
    fn class(&self) -> AssetClass;

    /// Process every matching source under `root`.
    fn run(&self, root: &Path) -> Result<TransformOutput>;
}

/// Files produced by one transform run.
#[derive(Debug, Clone)]
pub struct TransformOutput {
    pub class: AssetClass,
    pub produced: Vec<ProducedFile>,
}

impl TransformOutput {
    pub fn new(class: AssetClass) -> Self {
        Self {
            class,
            produced: Vec::new(),
        }
    }

    /// Number of files whose contents actually changed on disk.
    pub fn written_count(&self) -> usize {
        self.produced.iter().filter(|f| f.written).count()
    }
}

/// The project's concrete transforms, bound to a root directory.
#[derive(Debug)]
pub struct Pipeline {
    root: PathBuf,
    config: ConfigFile,
    transforms: Vec<Box<dyn Transform>>,
}

impl Pipeline {
    /// Build the four transforms from config and a resolved toolchain.
    pub fn new(root: impl Into<PathBuf>, config: ConfigFile, toolchain: &Toolchain) -> Self {
        let paths = config.paths();
        let output = config.output();

        let transforms: Vec<Box<dyn Transform>> = vec![
            Box::new(StyleTransform::new(
                paths.pattern(AssetClass::Styles),
                output.dir(AssetClass::Styles),
                toolchain.style_compiler().clone(),
            )),
            Box::new(FontTransform::new(
                paths.pattern(AssetClass::Fonts),
                output.dir(AssetClass::Fonts),
            )),
            Box::new(ScriptTransform::new(
                paths.pattern(AssetClass::Scripts),
                output.dir(AssetClass::Scripts),
                config.scripts().bundle.clone(),
                toolchain.script_minifier().cloned(),
            )),
            Box::new(ImageTransform::new(
                paths.pattern(AssetClass::Images),
                output.dir(AssetClass::Images),
                toolchain.image_optimizers().clone(),
            )),
        ];

        Self {
            root: root.into(),
            config,
            transforms,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    /// Run the transform for one asset class.
    pub fn run_transform(&self, class: AssetClass) -> Result<TransformOutput> {
        let transform = self
            .transforms
            .iter()
            .find(|t| t.class() == class)
            .ok_or_else(|| anyhow::anyhow!("no transform registered for {class}"))?;
        transform.run(&self.root)
    }
}
