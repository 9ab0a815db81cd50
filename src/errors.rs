// src/errors.rs

//! Crate-wide error types.
//!
//! - [`TransformError`]: a Transform failed on a specific input.
//! - [`CompositionError`]: a task tree could not be composed.
//! - [`RunFailure`]: the first failure propagated out of a task run, tagged
//!   with the originating leaf task.
//! - [`WatchDispatchError`]: a change event matched no watch binding. Never
//!   fatal; the watcher logs it and moves on.
//! - [`SitebuildError`]: everything the binary can surface.

use std::path::PathBuf;

use thiserror::Error;

use crate::task::TaskName;

#[derive(Error, Debug)]
pub enum TransformError {
    #[error("IO error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("syntax error in {path:?}: {message}")]
    Syntax { path: PathBuf, message: String },

    #[error("image error in {path:?}: {message}")]
    Image { path: PathBuf, message: String },

    #[error("invalid glob pattern: {0}")]
    Glob(String),

    #[error("{0}")]
    Failed(String),
}

impl TransformError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        TransformError::Io {
            path: path.into(),
            source,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompositionError {
    #[error("cannot compose an empty {kind} task")]
    EmptyComposition { kind: &'static str },
}

/// First failure observed while running a task tree.
#[derive(Error, Debug)]
#[error("task '{task}' failed: {source}")]
pub struct RunFailure {
    /// Name of the leaf task that failed.
    pub task: TaskName,
    #[source]
    pub source: TransformError,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WatchDispatchError {
    #[error("no watch binding matches '{path}'")]
    NoBinding { path: String },
}

#[derive(Error, Debug)]
pub enum SitebuildError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Composition(#[from] CompositionError),

    #[error(transparent)]
    Run(#[from] RunFailure),

    #[error("file watcher error: {0}")]
    Watch(#[from] notify::Error),

    #[error("preview server error: {0}")]
    Server(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, SitebuildError>;
