// src/watch/mod.rs

//! File watching and change detection.
//!
//! This module is responsible for:
//! - Compiling the glob patterns of each [`WatchBinding`].
//! - Wiring up a cross-platform filesystem watcher (`notify`).
//! - Optionally skipping triggers whose watched content hash is unchanged.
//!
//! It does not run tasks; it only turns filesystem changes into binding
//! triggers for the engine.

pub mod cache;
pub mod event_handler;
pub mod hash;
pub mod path_utils;
pub mod patterns;
pub mod watcher;

pub use event_handler::{dispatch, process_file_change, HashState};
pub use patterns::{build_globset, collect_matching_files, PostAction, WatchBinding};
pub use watcher::{spawn_watcher, WatcherHandle};
