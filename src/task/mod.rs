// src/task/mod.rs

//! Tasks, composition and the runner.
//!
//! - [`node`] holds the immutable [`Task`] tree type.
//! - [`compose`] builds `series` / `parallel` composites and the
//!   recoverable wrapper used in dev mode.
//! - [`runner`] executes a tree and reports the first failure.
//! - [`build_run`] tracks one execution.

pub mod build_run;
pub mod compose;
pub mod node;
pub mod runner;

pub use build_run::{BuildReport, BuildRun, LeafRecord, RunState};
pub use compose::{parallel, recoverable, series};
pub use node::{LeafFn, LeafOutput, LeafResult, Task, TaskKind, TaskName};
pub use runner::run;
