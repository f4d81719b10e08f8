// src/transform/scripts.rs

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::debug;

use crate::errors::Result;
use crate::transform::output::write_if_changed;
use crate::transform::sources::collect_matching_files;
use crate::transform::tool::ResolvedTool;
use crate::transform::{Transform, TransformOutput};
use crate::types::AssetClass;

/// Concatenates all scripts (sorted by path, newline-separated) into one
/// bundle and pipes it through the minifier when one is configured.
#[derive(Debug, Clone)]
pub struct ScriptTransform {
    pattern: String,
    dest: PathBuf,
    bundle: String,
    minifier: Option<ResolvedTool>,
}

impl ScriptTransform {
    pub fn new(
        pattern: impl Into<String>,
        dest: impl Into<PathBuf>,
        bundle: impl Into<String>,
        minifier: Option<ResolvedTool>,
    ) -> Self {
        Self {
            pattern: pattern.into(),
            dest: dest.into(),
            bundle: bundle.into(),
            minifier,
        }
    }
}

impl Transform for ScriptTransform {
    fn class(&self) -> AssetClass {
        AssetClass::Scripts
    }

    fn run(&self, root: &Path) -> Result<TransformOutput> {
        let mut output = TransformOutput::new(self.class());
        let sources = collect_matching_files(root, &self.pattern)?;

        if sources.is_empty() {
            debug!(pattern = %self.pattern, "no scripts matched; no bundle written");
            return Ok(output);
        }

        let mut bundle = Vec::new();
        for (i, source) in sources.iter().enumerate() {
            if i > 0 {
                bundle.push(b'\n');
            }
            let bytes = fs::read(&source.path)
                .with_context(|| format!("reading script {:?}", source.path))?;
            bundle.extend_from_slice(&bytes);
        }

        let contents = match &self.minifier {
            Some(minifier) => minifier.run_with_stdin(bundle, &self.bundle)?,
            None => bundle,
        };

        let rel = self.dest.join(&self.bundle);
        output.produced.push(write_if_changed(root, &rel, &contents)?);
        Ok(output)
    }
}
