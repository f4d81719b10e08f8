// src/watch/patterns.rs

use std::fmt;
use std::path::PathBuf;

use anyhow::{Context, Result};
use globset::{Glob, GlobBuilder, GlobSet, GlobSetBuilder};

use crate::config::model::ConfigFile;
use crate::errors::SiteError;
use crate::types::{AssetClass, TaskId};

/// A compiled watch binding: a set of globs plus the task whose downstream
/// sequence runs when a matching file changes.
///
/// Patterns are relative to the project root; the watcher passes relative,
/// forward-slash paths (e.g. `"src/styles/main.scss"`) into `matches`.
#[derive(Clone)]
pub struct WatchBinding {
    name: String,
    entry: TaskId,
    patterns: Vec<String>,
    set: GlobSet,
}

impl fmt::Debug for WatchBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchBinding")
            .field("name", &self.name)
            .field("entry", &self.entry)
            .field("patterns", &self.patterns)
            .finish_non_exhaustive()
    }
}

impl WatchBinding {
    pub fn new<N: Into<String>>(name: N, entry: TaskId, patterns: Vec<String>) -> Result<Self> {
        let name = name.into();
        let set = build_globset(&patterns)
            .with_context(|| format!("building globset for watch binding {name}"))?;
        Ok(Self {
            name,
            entry,
            patterns,
            set,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// First task of the sequence this binding runs.
    pub fn entry(&self) -> TaskId {
        self.entry
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// Returns true if a change to `rel_path` should trigger this binding.
    pub fn matches(&self, rel_path: &str) -> bool {
        self.set.is_match(rel_path)
    }
}

/// Build the fixed set of watch bindings: one per asset class plus one for
/// generator templates.
pub fn build_watch_bindings(cfg: &ConfigFile) -> Result<Vec<WatchBinding>> {
    let mut bindings = Vec::with_capacity(AssetClass::ALL.len() + 1);

    for class in AssetClass::ALL {
        bindings.push(WatchBinding::new(
            class.as_str(),
            class.task(),
            vec![cfg.paths().pattern(class).to_string()],
        )?);
    }

    if !cfg.paths().templates.is_empty() {
        bindings.push(WatchBinding::new(
            "templates",
            TaskId::Generate,
            cfg.paths().templates.clone(),
        )?);
    }

    Ok(bindings)
}

/// Compile a single glob where `*` and `?` never match `/`.
pub fn compile_glob(pattern: &str) -> Result<Glob, SiteError> {
    Ok(GlobBuilder::new(pattern).literal_separator(true).build()?)
}

/// Build a GlobSet from simple string patterns.
pub fn build_globset(patterns: &[String]) -> Result<GlobSet, SiteError> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        builder.add(compile_glob(pat)?);
    }
    Ok(builder.build()?)
}

/// Literal directory prefix of a glob, i.e. everything before the first
/// component containing a glob metacharacter.
///
/// `src/fonts/**/*.{ttf,woff}` → `src/fonts`; `*.html` → `` (project root).
/// Output paths of transforms are computed relative to this base.
pub fn glob_base(pattern: &str) -> PathBuf {
    let mut base = PathBuf::new();
    let mut components = pattern.split('/').peekable();

    while let Some(component) = components.next() {
        // The last component is always a file pattern, never part of the base.
        if components.peek().is_none() {
            break;
        }
        if component.contains(['*', '?', '[', '{']) {
            break;
        }
        if !component.is_empty() && component != "." {
            base.push(component);
        }
    }

    base
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn star_does_not_cross_directories() {
        let binding = WatchBinding::new(
            "templates",
            TaskId::Generate,
            vec!["*.html".into(), "_layouts/*.html".into()],
        )
        .unwrap();

        assert!(binding.matches("index.html"));
        assert!(binding.matches("_layouts/default.html"));
        assert!(!binding.matches("_site/index.html"));
        assert!(!binding.matches("_layouts/nested/page.html"));
    }

    #[test]
    fn brace_alternatives_and_double_star() {
        let binding = WatchBinding::new(
            "fonts",
            TaskId::Fonts,
            vec!["src/fonts/**/*.{ttf,woff,woff2}".into()],
        )
        .unwrap();

        assert!(binding.matches("src/fonts/a.ttf"));
        assert!(binding.matches("src/fonts/sub/dir/b.woff2"));
        assert!(!binding.matches("src/fonts/readme.md"));
        assert!(!binding.matches("assets/fonts/a.ttf"));
    }

    #[test]
    fn default_bindings_cover_classes_and_templates() {
        let bindings = build_watch_bindings(&ConfigFile::default()).unwrap();
        let entries: Vec<TaskId> = bindings.iter().map(|b| b.entry()).collect();
        assert_eq!(
            entries,
            vec![
                TaskId::Styles,
                TaskId::Fonts,
                TaskId::Scripts,
                TaskId::Images,
                TaskId::Generate
            ]
        );

        let styles = &bindings[0];
        assert!(styles.matches("src/styles/main.scss"));
        assert!(styles.matches("src/styles/partials/_vars.scss"));
        assert!(!styles.matches("src/js/app.js"));
    }

    #[test]
    fn invalid_glob_is_a_glob_error() {
        match build_globset(&["src/styles/[*.scss".to_string()]) {
            Err(SiteError::GlobError(err)) => assert!(err.to_string().contains("[*.scss")),
            other => panic!("expected GlobError, got {other:?}"),
        }
        assert!(WatchBinding::new("styles", TaskId::Styles, vec!["{a".into()]).is_err());
    }

    #[test]
    fn glob_base_stops_at_first_meta_component() {
        assert_eq!(glob_base("src/fonts/**/*.{ttf,woff}"), PathBuf::from("src/fonts"));
        assert_eq!(glob_base("src/js/*.js"), PathBuf::from("src/js"));
        assert_eq!(glob_base("*.html"), PathBuf::new());
        assert_eq!(glob_base("./src/img/**/*.png"), PathBuf::from("src/img"));
        assert_eq!(glob_base("src/{a,b}/*.css"), PathBuf::from("src"));
    }
}
