// src/watch/patterns.rs

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use walkdir::WalkDir;

use crate::task::Task;
use crate::watch::path_utils::relative_str;

/// What to do after a binding's task run succeeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostAction {
    /// Force every preview client to refresh fully.
    Reload,
}

/// A set of glob patterns bound to a task.
///
/// Patterns are relative to the source root. The watcher passes relative
/// paths (e.g. `"sass/_vars.scss"`) into `matches`. The task is a shared
/// handle onto the node that the lifecycle tree also references.
#[derive(Clone)]
pub struct WatchBinding {
    patterns: Vec<String>,
    watch_set: GlobSet,
    task: Task,
    post: Option<PostAction>,
}

impl fmt::Debug for WatchBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchBinding")
            .field("patterns", &self.patterns)
            .field("task", &self.task.name())
            .field("post", &self.post)
            .finish_non_exhaustive()
    }
}

impl WatchBinding {
    pub fn new<I, S>(patterns: I, task: Task) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let patterns: Vec<String> = patterns.into_iter().map(Into::into).collect();
        let watch_set = build_globset(&patterns)
            .with_context(|| format!("building watch globset for task {}", task.name()))?;

        Ok(Self {
            patterns,
            watch_set,
            task,
            post: None,
        })
    }

    pub fn then(mut self, post: PostAction) -> Self {
        self.post = Some(post);
        self
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    pub fn task(&self) -> &Task {
        &self.task
    }

    pub fn post(&self) -> Option<PostAction> {
        self.post
    }

    /// Returns true if this binding is interested in the given path
    /// (relative to the source root).
    pub fn matches(&self, rel_path: &str) -> bool {
        self.watch_set.is_match(rel_path)
    }
}

/// Compile glob patterns with `/` as a literal separator: `*` stays within
/// one directory, `**` crosses directories.
pub fn build_globset<S: AsRef<str>>(patterns: &[S]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        let pat = pat.as_ref();
        let glob = GlobBuilder::new(pat)
            .literal_separator(true)
            .build()
            .with_context(|| format!("invalid glob pattern: {pat}"))?;
        builder.add(glob);
    }
    Ok(builder.build()?)
}

/// Collect all files under `root` that match this binding's patterns.
///
/// Used when computing aggregated hashes for `use_hash`.
pub fn collect_matching_files(root: &Path, binding: &WatchBinding) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in WalkDir::new(root).follow_links(true) {
        let entry = entry.with_context(|| format!("walking {}", root.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        if let Some(rel) = relative_str(root, entry.path()) {
            if binding.matches(&rel) {
                files.push(entry.into_path());
            }
        }
    }

    files.sort();
    Ok(files)
}
