// src/watch/path_utils.rs

//! Utility functions for path handling in the watcher.

use std::path::Path;

/// Convert a path into a string relative to `root`, with forward slashes.
///
/// - First try a direct `strip_prefix(root)`.
/// - If that fails (symlinks, `/private/var` on macOS), canonicalize both
///   and try again.
/// - A removed file cannot be canonicalized, so fall back to its parent
///   directory plus the file name.
///
/// Returns `None` if the path cannot be related to `root`.
pub fn relative_str(root: &Path, path: &Path) -> Option<String> {
    if let Ok(rel) = path.strip_prefix(root) {
        return Some(to_slash(rel));
    }

    let root_canon = root.canonicalize().ok()?;

    if let Ok(path_canon) = path.canonicalize() {
        if let Ok(rel) = path_canon.strip_prefix(&root_canon) {
            return Some(to_slash(rel));
        }
    }

    let parent = path.parent()?.canonicalize().ok()?;
    let name = path.file_name()?;
    let rel = parent.strip_prefix(&root_canon).ok()?.join(name);
    Some(to_slash(&rel))
}

fn to_slash(rel: &Path) -> String {
    rel.to_string_lossy().replace('\\', "/")
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn strips_root_prefix() {
        let root = PathBuf::from("/site/source");
        let path = root.join("sass").join("_vars.scss");
        assert_eq!(relative_str(&root, &path).as_deref(), Some("sass/_vars.scss"));
    }

    #[test]
    fn unrelated_path_is_none() {
        let root = PathBuf::from("/definitely/not/here");
        assert_eq!(relative_str(&root, Path::new("/elsewhere/file.txt")), None);
    }

    #[test]
    fn removed_file_resolves_through_parent() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("js")).unwrap();
        let canon = dir.path().canonicalize().unwrap();
        // Event paths may use a different prefix than the configured root.
        let root = dir.path().join("js").join("..");
        let gone = canon.join("js").join("deleted.js");
        assert_eq!(relative_str(&root, &gone).as_deref(), Some("js/deleted.js"));
    }
}
