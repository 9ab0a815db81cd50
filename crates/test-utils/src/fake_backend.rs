use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use sitebuild::engine::{BindingId, RunOutcome, RuntimeEvent};
use sitebuild::errors::Result;
use sitebuild::exec::RunBackend;

/// A fake backend that:
/// - records which bindings were started
/// - immediately reports `RunFinished` with a fixed outcome.
pub struct FakeRunBackend {
    runtime_tx: mpsc::Sender<RuntimeEvent>,
    started: Arc<Mutex<Vec<BindingId>>>,
    outcome: RunOutcome,
}

impl FakeRunBackend {
    pub fn new(
        runtime_tx: mpsc::Sender<RuntimeEvent>,
        started: Arc<Mutex<Vec<BindingId>>>,
    ) -> Self {
        Self {
            runtime_tx,
            started,
            outcome: RunOutcome::Success,
        }
    }

    pub fn failing(mut self) -> Self {
        self.outcome = RunOutcome::Failed;
        self
    }
}

impl RunBackend for FakeRunBackend {
    fn start_run(
        &mut self,
        binding: BindingId,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let tx = self.runtime_tx.clone();
        let started = Arc::clone(&self.started);
        let outcome = self.outcome;

        Box::pin(async move {
            started.lock().unwrap().push(binding);
            tx.send(RuntimeEvent::RunFinished { binding, outcome })
                .await
                .map_err(anyhow::Error::from)?;
            Ok(())
        })
    }
}
