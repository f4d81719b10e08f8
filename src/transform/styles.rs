// src/transform/styles.rs

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::errors::Result;
use crate::transform::output::write_if_changed;
use crate::transform::sources::collect_matching_files;
use crate::transform::tool::ResolvedTool;
use crate::transform::{Transform, TransformOutput};
use crate::types::AssetClass;

/// Compiles every non-partial stylesheet with the resolved compiler and
/// writes `<dest>/<rel>.css`.
///
/// Partials (file names starting with `_`) are only reachable through
/// imports, so they are skipped as entry points.
#[derive(Debug, Clone)]
pub struct StyleTransform {
    pattern: String,
    dest: PathBuf,
    compiler: ResolvedTool,
}

impl StyleTransform {
    pub fn new(pattern: impl Into<String>, dest: impl Into<PathBuf>, compiler: ResolvedTool) -> Self {
        Self {
            pattern: pattern.into(),
            dest: dest.into(),
            compiler,
        }
    }
}

fn is_partial(path: &Path) -> bool {
    path.file_name()
        .map(|n| n.to_string_lossy().starts_with('_'))
        .unwrap_or(false)
}

impl Transform for StyleTransform {
    fn class(&self) -> AssetClass {
        AssetClass::Styles
    }

    fn run(&self, root: &Path) -> Result<TransformOutput> {
        let mut output = TransformOutput::new(self.class());

        for source in collect_matching_files(root, &self.pattern)? {
            if is_partial(&source.path) {
                debug!(path = ?source.path, "skipping style partial");
                continue;
            }
            let css = self.compiler.run_on_file(&source.path)?;
            let rel = self.dest.join(source.rel_to_base.with_extension("css"));
            output.produced.push(write_if_changed(root, &rel, &css)?);
        }

        Ok(output)
    }
}
