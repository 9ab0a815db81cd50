// src/exec/backend.rs

//! Pluggable run backend abstraction.
//!
//! The watch runtime talks to a `RunBackend` instead of running tasks
//! itself. Production code uses [`TaskRunBackend`]; tests can provide their
//! own implementation that records which bindings were started and directly
//! emits `RunFinished` events.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::engine::{BindingId, RunOutcome, RuntimeEvent};
use crate::errors::{Result, SitebuildError};
use crate::server::LiveReload;
use crate::task;
use crate::watch::{PostAction, WatchBinding};

/// Trait abstracting how a binding's task run is started.
pub trait RunBackend: Send {
    /// Start the task bound to `binding`.
    ///
    /// Must return once the run is underway, not when it finishes. The
    /// backend reports completion by sending `RuntimeEvent::RunFinished`.
    fn start_run(
        &mut self,
        binding: BindingId,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}

/// Real backend: runs the bound task through the runner, performs the
/// binding's post-action and reports back to the runtime.
pub struct TaskRunBackend {
    bindings: Arc<Vec<WatchBinding>>,
    live: Arc<dyn LiveReload>,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
}

impl TaskRunBackend {
    pub fn new(
        bindings: Arc<Vec<WatchBinding>>,
        live: Arc<dyn LiveReload>,
        runtime_tx: mpsc::Sender<RuntimeEvent>,
    ) -> Self {
        Self {
            bindings,
            live,
            runtime_tx,
        }
    }
}

impl RunBackend for TaskRunBackend {
    fn start_run(
        &mut self,
        binding: BindingId,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let entry = self.bindings.get(binding).cloned();
        let live = Arc::clone(&self.live);
        let tx = self.runtime_tx.clone();

        Box::pin(async move {
            let entry = entry.ok_or_else(|| {
                SitebuildError::ConfigError(format!("unknown watch binding #{binding}"))
            })?;
            tokio::spawn(run_binding(binding, entry, live, tx));
            Ok(())
        })
    }
}

async fn run_binding(
    binding: BindingId,
    entry: WatchBinding,
    live: Arc<dyn LiveReload>,
    tx: mpsc::Sender<RuntimeEvent>,
) {
    let outcome = match task::run(entry.task()).await {
        Ok(report) => {
            info!(
                task = %entry.task().name(),
                elapsed_ms = report.elapsed.as_millis() as u64,
                "rebuild finished"
            );
            if let Some(PostAction::Reload) = entry.post() {
                live.reload();
            }
            RunOutcome::Success
        }
        Err(failure) => {
            error!(
                task = %failure.task,
                error = %failure.source,
                "rebuild failed; still watching"
            );
            live.build_error(&failure.task, &failure.source.to_string());
            RunOutcome::Failed
        }
    };

    if tx
        .send(RuntimeEvent::RunFinished { binding, outcome })
        .await
        .is_err()
    {
        debug!(binding, "runtime gone before run finished");
    }
}
