// src/transform/images.rs

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::errors::Result;
use crate::transform::output::write_if_changed;
use crate::transform::sources::collect_matching_files;
use crate::transform::tool::ResolvedTool;
use crate::transform::{Transform, TransformOutput};
use crate::types::AssetClass;

/// Runs each image through the optimizer registered for its extension.
/// Images without an optimizer are copied as-is.
#[derive(Debug, Clone)]
pub struct ImageTransform {
    pattern: String,
    dest: PathBuf,
    optimizers: BTreeMap<String, ResolvedTool>,
}

impl ImageTransform {
    pub fn new(
        pattern: impl Into<String>,
        dest: impl Into<PathBuf>,
        optimizers: BTreeMap<String, ResolvedTool>,
    ) -> Self {
        Self {
            pattern: pattern.into(),
            dest: dest.into(),
            optimizers,
        }
    }

    fn optimizer_for(&self, path: &Path) -> Option<&ResolvedTool> {
        let ext = path.extension()?.to_string_lossy().to_lowercase();
        self.optimizers.get(&ext)
    }
}

impl Transform for ImageTransform {
    fn class(&self) -> AssetClass {
        AssetClass::Images
    }

    fn run(&self, root: &Path) -> Result<TransformOutput> {
        let mut output = TransformOutput::new(self.class());

        for source in collect_matching_files(root, &self.pattern)? {
            let bytes = match self.optimizer_for(&source.path) {
                Some(tool) => tool.run_on_file(&source.path)?,
                None => fs::read(&source.path)
                    .with_context(|| format!("reading image {:?}", source.path))?,
            };
            let rel = self.dest.join(&source.rel_to_base);
            output.produced.push(write_if_changed(root, &rel, &bytes)?);
        }

        Ok(output)
    }
}
