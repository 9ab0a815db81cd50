// src/watch/event_handler.rs

//! Event processing logic for file system changes.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::engine::{BindingId, RuntimeEvent};
use crate::errors::WatchDispatchError;
use crate::watch::cache::FileCache;
use crate::watch::hash::{compute_aggregate_hash, MemoryHashStore};
use crate::watch::path_utils::relative_str;
use crate::watch::patterns::{collect_matching_files, WatchBinding};

/// Hash bookkeeping shared by all change events when `use_hash` is on.
#[derive(Debug, Default)]
pub struct HashState {
    store: MemoryHashStore,
    cache: FileCache,
}

impl HashState {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Indices of every binding whose patterns match `rel_path`.
pub fn dispatch(
    bindings: &[WatchBinding],
    rel_path: &str,
) -> Result<Vec<BindingId>, WatchDispatchError> {
    let matched: Vec<BindingId> = bindings
        .iter()
        .enumerate()
        .filter(|(_, b)| b.matches(rel_path))
        .map(|(id, _)| id)
        .collect();

    if matched.is_empty() {
        Err(WatchDispatchError::NoBinding {
            path: rel_path.to_string(),
        })
    } else {
        Ok(matched)
    }
}

/// Process a single changed path and trigger every matching binding.
///
/// 1. Relativize the path against the source root.
/// 2. Match it against each binding independently.
/// 3. Apply the hash filter if enabled.
/// 4. Send `BindingTriggered` to the runtime.
///
/// Returns false once the runtime channel is closed.
pub async fn process_file_change(
    root: &Path,
    path: &Path,
    bindings: &Arc<Vec<WatchBinding>>,
    runtime_tx: &mpsc::Sender<RuntimeEvent>,
    hashing: Option<&Arc<Mutex<HashState>>>,
) -> bool {
    let Some(rel_str) = relative_str(root, path) else {
        warn!("could not relativize path {:?} against root {:?}", path, root);
        return true;
    };

    let matched = match dispatch(bindings, &rel_str) {
        Ok(ids) => ids,
        Err(err) => {
            debug!(%err, "ignoring change");
            return true;
        }
    };

    for id in matched {
        if let Some(state) = hashing {
            let binding = bindings[id].clone();
            if !content_changed(root, path, id, binding, Arc::clone(state)).await {
                continue;
            }
        }

        debug!(binding = id, path = %rel_str, "watch match -> triggering binding");
        let event = RuntimeEvent::BindingTriggered {
            binding: id,
            path: rel_str.clone(),
        };
        if runtime_tx.send(event).await.is_err() {
            warn!("runtime channel closed; stopping change processing");
            return false;
        }
    }

    true
}

/// True when the aggregated content of the binding's files differs from the
/// last triggered state. Any hashing problem counts as a change.
async fn content_changed(
    root: &Path,
    abs_path: &Path,
    id: BindingId,
    binding: WatchBinding,
    state: Arc<Mutex<HashState>>,
) -> bool {
    let root: PathBuf = root.to_path_buf();
    let abs_path: PathBuf = abs_path.to_path_buf();

    tokio::task::spawn_blocking(move || {
        let files = match collect_matching_files(&root, &binding) {
            Ok(f) => f,
            Err(err) => {
                warn!(binding = id, error = %err, "failed to collect watched files; triggering anyway");
                return true;
            }
        };

        let mut state = state.lock().unwrap_or_else(PoisonError::into_inner);
        state.cache.invalidate(&abs_path);

        let mut entries = Vec::with_capacity(files.len());
        for file in files {
            match state.cache.get_or_compute(&file) {
                Ok(hash) => {
                    let rel = relative_str(&root, &file)
                        .unwrap_or_else(|| file.display().to_string());
                    entries.push((rel, hash));
                }
                Err(err) => {
                    warn!(binding = id, file = ?file, error = %err, "failed to hash file; triggering anyway");
                    return true;
                }
            }
        }

        let new_hash = compute_aggregate_hash(&entries);
        if state.store.load(id) == Some(new_hash.as_str()) {
            info!(
                binding = id,
                task = %binding.task().name(),
                "watched content unchanged; skipping rebuild"
            );
            return false;
        }
        state.store.save(id, new_hash);
        true
    })
    .await
    .unwrap_or(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::Task;

    fn bindings() -> Vec<WatchBinding> {
        let noop = || Task::sync("t", || Ok(Vec::new()));
        vec![
            WatchBinding::new(["sass/**/*.scss"], noop()).unwrap(),
            WatchBinding::new(["*.html"], noop()).unwrap(),
            WatchBinding::new(["**/*.html"], noop()).unwrap(),
        ]
    }

    #[test]
    fn dispatch_returns_every_match() {
        let b = bindings();
        assert_eq!(dispatch(&b, "index.html").unwrap(), vec![1, 2]);
        assert_eq!(dispatch(&b, "sass/_a.scss").unwrap(), vec![0]);
    }

    #[test]
    fn unmatched_path_is_a_dispatch_error() {
        let err = dispatch(&bindings(), "fonts/a.woff2").unwrap_err();
        assert_eq!(
            err,
            WatchDispatchError::NoBinding {
                path: "fonts/a.woff2".into()
            }
        );
    }

    #[tokio::test]
    async fn unchanged_content_is_skipped_with_hashing() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), "<p>hi</p>").unwrap();
        let root = dir.path().to_path_buf();
        let bindings = Arc::new(vec![
            WatchBinding::new(["*.html"], Task::sync("html", || Ok(Vec::new()))).unwrap(),
        ]);
        let state = Arc::new(Mutex::new(HashState::new()));
        let (tx, mut rx) = mpsc::channel(8);
        let path = root.join("index.html");

        assert!(process_file_change(&root, &path, &bindings, &tx, Some(&state)).await);
        assert!(process_file_change(&root, &path, &bindings, &tx, Some(&state)).await);
        std::fs::write(&path, "<p>changed</p>").unwrap();
        assert!(process_file_change(&root, &path, &bindings, &tx, Some(&state)).await);
        drop(tx);

        let mut triggered = 0;
        while rx.recv().await.is_some() {
            triggered += 1;
        }
        assert_eq!(triggered, 2);
    }
}
