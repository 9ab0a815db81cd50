// src/engine/runtime.rs

use std::fmt;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::errors::Result;
use crate::exec::RunBackend;

use super::core::CoreRuntime;
use super::{CoreCommand, RunOutcome, RuntimeEvent};

/// Drives the watch core in response to `RuntimeEvent`s and delegates task
/// runs to a `RunBackend`.
///
/// This is a pure IO shell around `CoreRuntime`: it reads events, arms
/// debounce timers on the Tokio clock and hands `StartRun` to the backend.
pub struct Runtime<B: RunBackend> {
    core: CoreRuntime,
    event_rx: mpsc::Receiver<RuntimeEvent>,
    event_tx: mpsc::Sender<RuntimeEvent>,
    backend: B,
}

impl<B: RunBackend> fmt::Debug for Runtime<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("core", &self.core)
            .finish_non_exhaustive()
    }
}

impl<B: RunBackend> Runtime<B> {
    /// `event_tx` must feed `event_rx`; timers post back through it.
    pub fn new(
        core: CoreRuntime,
        event_rx: mpsc::Receiver<RuntimeEvent>,
        event_tx: mpsc::Sender<RuntimeEvent>,
        backend: B,
    ) -> Self {
        Self {
            core,
            event_rx,
            event_tx,
            backend,
        }
    }

    /// Main event loop. Returns when shutdown is requested or every sender
    /// is gone.
    pub async fn run(mut self) -> Result<()> {
        info!("watch runtime started");

        loop {
            let event = match self.event_rx.recv().await {
                Some(e) => e,
                None => {
                    info!("runtime event channel closed; exiting");
                    break;
                }
            };

            debug!(?event, "runtime received event");

            let step = self.core.step(event);

            for command in step.commands {
                self.execute_command(command).await?;
            }

            if !step.keep_running {
                info!("shutdown requested; stopping watch runtime");
                break;
            }
        }

        Ok(())
    }

    async fn execute_command(&mut self, command: CoreCommand) -> Result<()> {
        match command {
            CoreCommand::ArmDebounce {
                binding,
                generation,
                delay,
            } => {
                let tx = self.event_tx.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    if tx
                        .send(RuntimeEvent::DebounceElapsed {
                            binding,
                            generation,
                        })
                        .await
                        .is_err()
                    {
                        debug!(binding, "runtime gone before debounce fired");
                    }
                });
            }
            CoreCommand::StartRun { binding } => {
                if let Err(err) = self.backend.start_run(binding).await {
                    warn!(binding, error = %err, "failed to start binding run");
                    // Free the slot so later changes can still run.
                    let finished = RuntimeEvent::RunFinished {
                        binding,
                        outcome: RunOutcome::Failed,
                    };
                    if self.event_tx.try_send(finished).is_err() {
                        warn!(binding, "could not release binding after failed start");
                    }
                }
            }
        }
        Ok(())
    }
}
