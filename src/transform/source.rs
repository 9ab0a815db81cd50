// src/transform/source.rs

//! Input discovery for transforms.

use std::path::{Path, PathBuf};

use globset::GlobSet;
use walkdir::WalkDir;

use crate::errors::TransformError;
use crate::watch::build_globset;
use crate::watch::path_utils::relative_str;

/// One input file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Path relative to the source set's base, `/`-separated.
    pub rel: String,
    /// Absolute (or caller-rooted) path on disk.
    pub path: PathBuf,
}

impl SourceFile {
    pub fn read(&self) -> Result<Vec<u8>, TransformError> {
        std::fs::read(&self.path).map_err(|e| TransformError::io(&self.path, e))
    }

    pub fn read_to_string(&self) -> Result<String, TransformError> {
        std::fs::read_to_string(&self.path).map_err(|e| TransformError::io(&self.path, e))
    }

    /// File name without its extension.
    pub fn stem(&self) -> String {
        Path::new(&self.rel)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// A base directory plus include/exclude globs relative to it.
#[derive(Debug, Clone)]
pub struct SourceSet {
    base: PathBuf,
    include: GlobSet,
    exclude: Option<GlobSet>,
}

impl SourceSet {
    pub fn new<S: AsRef<str>>(base: impl Into<PathBuf>, include: &[S]) -> Result<Self, TransformError> {
        Ok(Self {
            base: base.into(),
            include: compile(include)?,
            exclude: None,
        })
    }

    pub fn exclude<S: AsRef<str>>(mut self, patterns: &[S]) -> Result<Self, TransformError> {
        if !patterns.is_empty() {
            self.exclude = Some(compile(patterns)?);
        }
        Ok(self)
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Every matching file, sorted by relative path. A missing base
    /// directory is an empty set.
    pub fn collect(&self) -> Result<Vec<SourceFile>, TransformError> {
        if !self.base.is_dir() {
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(&self.base).follow_links(true) {
            let entry = entry.map_err(|e| {
                let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| self.base.clone());
                TransformError::io(path, e.into())
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Some(rel) = relative_str(&self.base, entry.path()) else {
                continue;
            };
            if !self.include.is_match(&rel) {
                continue;
            }
            if self.exclude.as_ref().is_some_and(|ex| ex.is_match(&rel)) {
                continue;
            }
            files.push(SourceFile {
                rel,
                path: entry.into_path(),
            });
        }

        files.sort_by(|a, b| a.rel.cmp(&b.rel));
        Ok(files)
    }
}

fn compile<S: AsRef<str>>(patterns: &[S]) -> Result<GlobSet, TransformError> {
    build_globset(patterns).map_err(|e| TransformError::Glob(format!("{e:#}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        std::fs::create_dir_all(root.join("img/sprite-icons")).unwrap();
        std::fs::create_dir_all(root.join("fonts")).unwrap();
        for file in [
            "img/logo.svg",
            "img/hero.jpg",
            "img/sprite-icons/cart.svg",
            "fonts/a.woff2",
            "favicon.ico",
            "index.html",
        ] {
            std::fs::write(root.join(file), b"x").unwrap();
        }
        dir
    }

    #[test]
    fn include_and_exclude() {
        let dir = tree();
        let set = SourceSet::new(dir.path().join("img"), &["**/*.svg"])
            .unwrap()
            .exclude(&["sprite-icons/**"])
            .unwrap();
        let rels: Vec<String> = set.collect().unwrap().into_iter().map(|f| f.rel).collect();
        assert_eq!(rels, vec!["logo.svg"]);
    }

    #[test]
    fn top_level_star_stays_at_root() {
        let dir = tree();
        let set = SourceSet::new(dir.path(), &["fonts/*.{woff2,woff}", "*.ico"]).unwrap();
        let rels: Vec<String> = set.collect().unwrap().into_iter().map(|f| f.rel).collect();
        assert_eq!(rels, vec!["favicon.ico", "fonts/a.woff2"]);
    }

    #[test]
    fn missing_base_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let set = SourceSet::new(dir.path().join("nope"), &["*.js"]).unwrap();
        assert!(set.collect().unwrap().is_empty());
    }

    #[test]
    fn bad_glob_is_reported() {
        assert!(matches!(
            SourceSet::new(".", &["[oops"]),
            Err(TransformError::Glob(_))
        ));
    }
}
