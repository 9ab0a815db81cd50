// src/engine/event_handlers.rs

//! Event handling logic for the core runtime.

use std::time::Duration;

use tracing::debug;

use crate::engine::slot::BindingSlot;
use crate::engine::{BindingId, RunOutcome};

/// Command produced by the pure core, to be executed by the outer IO shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreCommand {
    /// Deliver `DebounceElapsed { binding, generation }` after `delay`.
    ArmDebounce {
        binding: BindingId,
        generation: u64,
        delay: Duration,
    },
    /// Run the binding's task now.
    StartRun { binding: BindingId },
}

/// Decision returned by the core after handling a single `RuntimeEvent`.
#[derive(Debug, Clone)]
pub struct CoreStep {
    /// Commands the IO shell should execute.
    pub commands: Vec<CoreCommand>,
    /// Whether the outer runtime loop should keep running.
    pub keep_running: bool,
}

impl CoreStep {
    pub(crate) fn continue_with(commands: Vec<CoreCommand>) -> Self {
        Self {
            commands,
            keep_running: true,
        }
    }
}

/// A changed path matched `binding`: (re)arm its debounce timer.
pub fn handle_binding_trigger(
    slot: &mut BindingSlot,
    binding: BindingId,
    path: String,
    debounce: Duration,
) -> CoreStep {
    let generation = slot.record_trigger(path);
    CoreStep::continue_with(vec![CoreCommand::ArmDebounce {
        binding,
        generation,
        delay: debounce,
    }])
}

/// A debounce timer fired. Stale generations are ignored.
pub fn handle_debounce_elapsed(
    slot: &mut BindingSlot,
    binding: BindingId,
    generation: u64,
) -> CoreStep {
    if !slot.is_current(generation) {
        debug!(binding, generation, "superseded debounce timer");
        return CoreStep::continue_with(Vec::new());
    }

    if slot.window_closed() {
        debug!(binding, path = ?slot.last_path(), "debounce window closed; starting run");
        CoreStep::continue_with(vec![CoreCommand::StartRun { binding }])
    } else {
        debug!(binding, "run in flight; queued one follow-up run");
        CoreStep::continue_with(Vec::new())
    }
}

/// The binding's run resolved; start the queued follow-up if there is one.
pub fn handle_run_finished(
    slot: &mut BindingSlot,
    binding: BindingId,
    outcome: RunOutcome,
) -> CoreStep {
    debug!(binding, ?outcome, "binding run finished");
    if slot.run_finished() {
        CoreStep::continue_with(vec![CoreCommand::StartRun { binding }])
    } else {
        CoreStep::continue_with(Vec::new())
    }
}
