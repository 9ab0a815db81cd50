// src/engine/slot.rs

//! Per-binding coalescing state.

/// What a binding is doing right now.
///
/// - Every trigger bumps `generation`; only the timer armed with the newest
///   generation may start a run, so a burst inside the debounce window
///   collapses into one run.
/// - While a run is in flight, at most one follow-up run is remembered.
#[derive(Debug, Clone, Default)]
pub struct BindingSlot {
    generation: u64,
    running: bool,
    pending: bool,
    last_path: Option<String>,
}

impl BindingSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a trigger and return the generation the new timer must carry.
    pub fn record_trigger(&mut self, path: String) -> u64 {
        self.generation += 1;
        self.last_path = Some(path);
        self.generation
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.generation == generation
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn has_pending(&self) -> bool {
        self.pending
    }

    pub fn last_path(&self) -> Option<&str> {
        self.last_path.as_deref()
    }

    /// The window closed. Returns true if a run should start now; otherwise
    /// the run is parked as the single pending follow-up.
    pub fn window_closed(&mut self) -> bool {
        if self.running {
            self.pending = true;
            false
        } else {
            self.running = true;
            true
        }
    }

    /// The in-flight run resolved. Returns true if the pending follow-up
    /// should start now.
    pub fn run_finished(&mut self) -> bool {
        if self.pending {
            self.pending = false;
            true
        } else {
            self.running = false;
            false
        }
    }
}
