// src/transform/output.rs

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::trace;

/// A file written (or confirmed up to date) by a transform.
#[derive(Clone, PartialEq, Eq)]
pub struct ProducedFile {
    /// Path relative to the project root, e.g. `assets/css/main.css`.
    pub path: PathBuf,
    pub digest: blake3::Hash,
    /// False when the existing file already had identical contents.
    pub written: bool,
}

impl fmt::Debug for ProducedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProducedFile")
            .field("path", &self.path)
            .field("digest", &&self.digest.to_hex()[..12])
            .field("written", &self.written)
            .finish()
    }
}

/// Write `contents` to `root/rel_path` unless the file already holds exactly
/// these bytes. Parent directories are created as needed.
pub fn write_if_changed(root: &Path, rel_path: &Path, contents: &[u8]) -> Result<ProducedFile> {
    let digest = blake3::hash(contents);
    let path = root.join(rel_path);

    if let Ok(existing) = fs::read(&path) {
        if blake3::hash(&existing) == digest {
            trace!(path = ?rel_path, "output unchanged; not rewriting");
            return Ok(ProducedFile {
                path: rel_path.to_path_buf(),
                digest,
                written: false,
            });
        }
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("creating dir {:?}", parent))?;
    }
    fs::write(&path, contents).with_context(|| format!("writing output {:?}", path))?;

    Ok(ProducedFile {
        path: rel_path.to_path_buf(),
        digest,
        written: true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_identical_write_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let rel = Path::new("assets/css/main.css");

        let first = write_if_changed(dir.path(), rel, b"body{}").unwrap();
        assert!(first.written);

        let second = write_if_changed(dir.path(), rel, b"body{}").unwrap();
        assert!(!second.written);
        assert_eq!(first.digest, second.digest);

        let third = write_if_changed(dir.path(), rel, b"p{}").unwrap();
        assert!(third.written);
        assert_eq!(fs::read(dir.path().join(rel)).unwrap(), b"p{}");
    }
}
