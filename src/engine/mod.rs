// src/engine/mod.rs

//! Watch engine: turns binding triggers into debounced task runs.
//!
//! The pure core state machine lives in [`core`]; the async/IO shell is
//! implemented in [`runtime`]. The per-binding coalescing rules live in
//! [`slot`].

use std::time::Duration;

/// Index of a watch binding in the list handed to the engine.
pub type BindingId = usize;

/// Outcome of a binding's task run, as seen by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Success,
    Failed,
}

/// Options shared by the core and the async shell.
#[derive(Debug, Clone, Copy)]
pub struct RuntimeOptions {
    /// Per-binding quiet period before a run starts.
    pub debounce: Duration,
}

impl Default for RuntimeOptions {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(150),
        }
    }
}

/// Events flowing into the runtime from the watcher, timers and runs.
#[derive(Debug, Clone)]
pub enum RuntimeEvent {
    /// A changed path matched the binding's patterns.
    BindingTriggered { binding: BindingId, path: String },
    /// The debounce timer armed with `generation` fired.
    DebounceElapsed { binding: BindingId, generation: u64 },
    /// The binding's task run resolved.
    RunFinished {
        binding: BindingId,
        outcome: RunOutcome,
    },
    /// Graceful shutdown requested (e.g. Ctrl-C).
    ShutdownRequested,
}

pub mod core;
pub mod event_handlers;
pub mod runtime;
pub mod slot;

pub use core::CoreRuntime;
pub use event_handlers::{CoreCommand, CoreStep};
pub use runtime::Runtime;
pub use slot::BindingSlot;
