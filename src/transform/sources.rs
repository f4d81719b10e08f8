// src/transform/sources.rs

//! Source file discovery for transform tasks.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::watch::patterns::{build_globset, glob_base};
use crate::watch::path_utils::relative_str;

/// A source file matched by an asset-class pattern.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct SourceFile {
    /// Absolute (root-joined) path on disk.
    pub path: PathBuf,
    /// Path relative to the pattern's literal base directory; this is where
    /// the file lands under the transform's destination directory.
    pub rel_to_base: PathBuf,
}

/// Collect all files under `root` that match `pattern`, sorted by path.
///
/// Only the pattern's literal base directory is walked. A missing base
/// directory yields an empty list.
pub fn collect_matching_files(root: &Path, pattern: &str) -> Result<Vec<SourceFile>> {
    let set = build_globset(&[pattern.to_string()])?;
    let base_rel = glob_base(pattern);
    let base = root.join(&base_rel);

    let mut files = Vec::new();
    if !base.is_dir() {
        return Ok(files);
    }

    let mut stack = vec![base.clone()];
    while let Some(dir) = stack.pop() {
        let entries =
            fs::read_dir(&dir).with_context(|| format!("reading dir {:?}", dir))?;
        for entry in entries {
            let path = entry
                .with_context(|| format!("reading entry in {:?}", dir))?
                .path();
            if path.is_dir() {
                stack.push(path);
            } else if path.is_file() {
                let Some(rel) = relative_str(root, &path) else {
                    continue;
                };
                if set.is_match(&rel) {
                    let rel_to_base = path
                        .strip_prefix(&base)
                        .map(Path::to_path_buf)
                        .unwrap_or_else(|_| PathBuf::from(path.file_name().unwrap_or_default()));
                    files.push(SourceFile { path, rel_to_base });
                }
            }
        }
    }

    files.sort();
    Ok(files)
}
