// src/transform/fonts.rs

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::errors::Result;
use crate::transform::output::write_if_changed;
use crate::transform::sources::collect_matching_files;
use crate::transform::{Transform, TransformOutput};
use crate::types::AssetClass;

/// Copies font files verbatim into the destination directory.
#[derive(Debug, Clone)]
pub struct FontTransform {
    pattern: String,
    dest: PathBuf,
}

impl FontTransform {
    pub fn new(pattern: impl Into<String>, dest: impl Into<PathBuf>) -> Self {
        Self {
            pattern: pattern.into(),
            dest: dest.into(),
        }
    }
}

impl Transform for FontTransform {
    fn class(&self) -> AssetClass {
        AssetClass::Fonts
    }

    fn run(&self, root: &Path) -> Result<TransformOutput> {
        let mut output = TransformOutput::new(self.class());

        for source in collect_matching_files(root, &self.pattern)? {
            let bytes = fs::read(&source.path)
                .with_context(|| format!("reading font {:?}", source.path))?;
            let rel = self.dest.join(&source.rel_to_base);
            output.produced.push(write_if_changed(root, &rel, &bytes)?);
        }

        Ok(output)
    }
}
