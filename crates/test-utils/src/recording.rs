use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use sitebuild::server::LiveReload;

/// One call observed on the live-reload capability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LiveEvent {
    Notify(Vec<PathBuf>),
    Reload,
    BuildError { task: String },
}

/// `LiveReload` that only records what it was told.
#[derive(Debug, Default)]
pub struct RecordingLiveReload {
    events: Mutex<Vec<LiveEvent>>,
}

impl RecordingLiveReload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<LiveEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn reloads(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, LiveEvent::Reload))
            .count()
    }

    /// Every path passed to a non-empty `notify`.
    pub fn notified(&self) -> Vec<PathBuf> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                LiveEvent::Notify(paths) => Some(paths),
                _ => None,
            })
            .flatten()
            .collect()
    }

    /// Poll until `pred` holds on the recorded events.
    pub async fn wait_until<F>(&self, pred: F)
    where
        F: Fn(&[LiveEvent]) -> bool,
    {
        loop {
            if pred(&self.events()) {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }
}

impl LiveReload for RecordingLiveReload {
    fn notify(&self, changed: &[PathBuf]) {
        if changed.is_empty() {
            return;
        }
        self.events
            .lock()
            .unwrap()
            .push(LiveEvent::Notify(changed.to_vec()));
    }

    fn reload(&self) {
        self.events.lock().unwrap().push(LiveEvent::Reload);
    }

    fn build_error(&self, task: &str, _message: &str) {
        self.events.lock().unwrap().push(LiveEvent::BuildError {
            task: task.to_string(),
        });
    }
}
