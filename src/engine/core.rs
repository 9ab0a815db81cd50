// src/engine/core.rs

//! Pure core runtime state machine.
//!
//! This module contains a synchronous, deterministic "core runtime" that
//! consumes [`RuntimeEvent`]s and produces:
//! - an updated core state
//! - a list of "commands" describing what the IO shell should do next
//!
//! The async shell (`engine::runtime::Runtime`) owns timers, channels and
//! the run backend. The core is unit tested without any of them.

use tracing::warn;

use crate::engine::event_handlers::{
    handle_binding_trigger, handle_debounce_elapsed, handle_run_finished, CoreStep,
};
use crate::engine::slot::BindingSlot;
use crate::engine::{BindingId, RuntimeEvent, RuntimeOptions};

/// Pure core runtime state: one coalescing slot per watch binding.
#[derive(Debug)]
pub struct CoreRuntime {
    slots: Vec<BindingSlot>,
    options: RuntimeOptions,
}

impl CoreRuntime {
    pub fn new(binding_count: usize, options: RuntimeOptions) -> Self {
        Self {
            slots: vec![BindingSlot::new(); binding_count],
            options,
        }
    }

    /// Expose a binding's slot (for tests).
    pub fn slot(&self, binding: BindingId) -> Option<&BindingSlot> {
        self.slots.get(binding)
    }

    /// True when no binding has a run in flight or queued.
    pub fn is_idle(&self) -> bool {
        self.slots.iter().all(|s| !s.is_running() && !s.has_pending())
    }

    /// Handle a single runtime event, updating core state and returning the
    /// resulting commands for the IO shell.
    pub fn step(&mut self, event: RuntimeEvent) -> CoreStep {
        let debounce = self.options.debounce;
        match event {
            RuntimeEvent::BindingTriggered { binding, path } => match self.slots.get_mut(binding) {
                Some(slot) => handle_binding_trigger(slot, binding, path, debounce),
                None => unknown(binding),
            },
            RuntimeEvent::DebounceElapsed {
                binding,
                generation,
            } => match self.slots.get_mut(binding) {
                Some(slot) => handle_debounce_elapsed(slot, binding, generation),
                None => unknown(binding),
            },
            RuntimeEvent::RunFinished { binding, outcome } => match self.slots.get_mut(binding) {
                Some(slot) => handle_run_finished(slot, binding, outcome),
                None => unknown(binding),
            },
            RuntimeEvent::ShutdownRequested => CoreStep {
                commands: Vec::new(),
                keep_running: false,
            },
        }
    }
}

fn unknown(binding: BindingId) -> CoreStep {
    warn!(binding, "event for unknown watch binding ignored");
    CoreStep::continue_with(Vec::new())
}
