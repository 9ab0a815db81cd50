// src/watch/watcher.rs

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use notify::event::{MetadataKind, ModifyKind};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::engine::RuntimeEvent;
use crate::watch::event_handler::{process_file_change, HashState};
use crate::watch::patterns::WatchBinding;

/// Handle for the filesystem watcher.
///
/// Keeps the underlying `RecommendedWatcher` alive. Dropping this handle
/// stops file watching.
pub struct WatcherHandle {
    _inner: RecommendedWatcher,
}

impl std::fmt::Debug for WatcherHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatcherHandle").finish()
    }
}

/// Spawn a filesystem watcher that observes `root` recursively and sends
/// `RuntimeEvent::BindingTriggered` for bindings whose patterns match a
/// changed path.
///
/// - `root` is the source root against which all patterns are evaluated.
/// - `use_hash` enables the aggregated content-hash skip.
pub fn spawn_watcher(
    root: impl Into<PathBuf>,
    bindings: Arc<Vec<WatchBinding>>,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
    use_hash: bool,
) -> Result<WatcherHandle> {
    let root = root.into();
    let root = root.canonicalize().unwrap_or(root);

    // Channel from the blocking notify callback into the async world.
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<Event>();

    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            Ok(event) => {
                if event_tx.send(event).is_err() {
                    debug!("watcher loop gone; dropping notify event");
                }
            }
            Err(err) => warn!(error = %err, "file watch error"),
        },
        Config::default(),
    )?;

    watcher.watch(&root, RecursiveMode::Recursive)?;

    info!("file watcher started on {:?}", root);

    let hashing = use_hash.then(|| Arc::new(Mutex::new(HashState::new())));

    tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            if !is_content_change(&event.kind) {
                continue;
            }
            debug!(?event, "received notify event");

            for path in &event.paths {
                let alive =
                    process_file_change(&root, path, &bindings, &runtime_tx, hashing.as_ref())
                        .await;
                if !alive {
                    return;
                }
            }
        }
        debug!("watcher event loop finished");
    });

    Ok(WatcherHandle { _inner: watcher })
}

/// Reads by transforms must not re-trigger builds.
fn is_content_change(kind: &EventKind) -> bool {
    match kind {
        EventKind::Access(_) | EventKind::Other => false,
        EventKind::Modify(ModifyKind::Metadata(MetadataKind::AccessTime)) => false,
        EventKind::Any | EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_) => true,
    }
}
