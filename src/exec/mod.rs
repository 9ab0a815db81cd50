// src/exec/mod.rs

//! Run execution layer for the watch engine.
//!
//! [`backend`] provides the `RunBackend` trait and the concrete
//! `TaskRunBackend` used in production, which tests can replace with a
//! fake implementation.

pub mod backend;

pub use backend::{RunBackend, TaskRunBackend};
