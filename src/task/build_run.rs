// src/task/build_run.rs

//! Per-invocation bookkeeping for a task run.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use crate::task::{Task, TaskName};

static RUN_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Per-run state of a leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// Part of the tree but not started (yet, or ever if a series stopped).
    Pending,
    Running,
    DoneSuccess,
    DoneFailed,
}

#[derive(Debug, Clone)]
pub struct LeafRecord {
    pub state: RunState,
    pub elapsed: Option<Duration>,
    pub outputs: Vec<PathBuf>,
    pub error: Option<String>,
}

impl LeafRecord {
    fn pending() -> Self {
        Self {
            state: RunState::Pending,
            elapsed: None,
            outputs: Vec::new(),
            error: None,
        }
    }
}

/// One ephemeral execution of a task tree.
///
/// Created by [`crate::task::run`] and consumed into a [`BuildReport`] when
/// that invocation resolves. Leaves of a parallel composite update it from
/// the same scheduler task, so a plain mutex is enough.
#[derive(Debug)]
pub struct BuildRun {
    run_id: u64,
    started: Instant,
    leaves: Mutex<BTreeMap<TaskName, LeafRecord>>,
}

impl BuildRun {
    pub fn new(root: &Task) -> Self {
        let leaves = root
            .leaf_names()
            .into_iter()
            .map(|name| (name.to_string(), LeafRecord::pending()))
            .collect();

        Self {
            run_id: RUN_COUNTER.fetch_add(1, Ordering::Relaxed),
            started: Instant::now(),
            leaves: Mutex::new(leaves),
        }
    }

    pub fn run_id(&self) -> u64 {
        self.run_id
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn mark_running(&self, name: &str) {
        self.update(name, |rec| rec.state = RunState::Running);
    }

    pub fn mark_succeeded(&self, name: &str, outputs: Vec<PathBuf>, elapsed: Duration) {
        self.update(name, |rec| {
            rec.state = RunState::DoneSuccess;
            rec.elapsed = Some(elapsed);
            rec.outputs = outputs;
        });
    }

    pub fn mark_failed(&self, name: &str, message: String, elapsed: Duration) {
        self.update(name, |rec| {
            rec.state = RunState::DoneFailed;
            rec.elapsed = Some(elapsed);
            rec.error = Some(message);
        });
    }

    fn update(&self, name: &str, f: impl FnOnce(&mut LeafRecord)) {
        let mut leaves = self.leaves.lock().unwrap_or_else(PoisonError::into_inner);
        f(leaves
            .entry(name.to_string())
            .or_insert_with(LeafRecord::pending));
    }

    pub fn finish(self) -> BuildReport {
        let elapsed = self.elapsed();
        BuildReport {
            run_id: self.run_id,
            elapsed,
            leaves: self
                .leaves
                .into_inner()
                .unwrap_or_else(PoisonError::into_inner),
        }
    }
}

/// Read-only summary of a finished [`BuildRun`].
#[derive(Debug, Clone)]
pub struct BuildReport {
    pub run_id: u64,
    pub elapsed: Duration,
    pub leaves: BTreeMap<TaskName, LeafRecord>,
}

impl BuildReport {
    /// Every file written by the run's leaves.
    pub fn outputs(&self) -> Vec<PathBuf> {
        self.leaves
            .values()
            .flat_map(|rec| rec.outputs.iter().cloned())
            .collect()
    }

    pub fn state_of(&self, name: &str) -> Option<RunState> {
        self.leaves.get(name).map(|rec| rec.state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::series;

    #[test]
    fn leaves_start_pending_and_record_outcomes() {
        let tree = series([
            Task::sync("a", || Ok(Vec::new())),
            Task::sync("b", || Ok(Vec::new())),
        ])
        .unwrap();

        let run = BuildRun::new(&tree);
        run.mark_running("a");
        run.mark_succeeded("a", vec![PathBuf::from("out/a.txt")], Duration::from_millis(3));

        let report = run.finish();
        assert_eq!(report.state_of("a"), Some(RunState::DoneSuccess));
        assert_eq!(report.state_of("b"), Some(RunState::Pending));
        assert_eq!(report.outputs(), vec![PathBuf::from("out/a.txt")]);
    }

    #[test]
    fn run_ids_are_unique() {
        let task = Task::sync("x", || Ok(Vec::new()));
        let a = BuildRun::new(&task);
        let b = BuildRun::new(&task);
        assert_ne!(a.run_id(), b.run_id());
    }
}
