// src/task/node.rs

//! The immutable task tree.

use std::fmt;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::stream::{BoxStream, Stream, StreamExt};
use futures::FutureExt;

use crate::errors::TransformError;

/// Canonical task name type.
pub type TaskName = String;

/// Completion signal produced by invoking a leaf.
pub enum LeafOutput {
    /// Batch leaf: every output is already written.
    Complete(Vec<PathBuf>),
    /// Streaming leaf: each written file is emitted as it completes. The leaf
    /// is only done once the stream ends.
    Streaming(BoxStream<'static, Result<PathBuf, TransformError>>),
}

impl fmt::Debug for LeafOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LeafOutput::Complete(files) => f.debug_tuple("Complete").field(files).finish(),
            LeafOutput::Streaming(_) => f.write_str("Streaming(..)"),
        }
    }
}

pub type LeafResult = Result<LeafOutput, TransformError>;

/// Zero-argument callable bound to a leaf.
pub type LeafFn = dyn Fn() -> BoxFuture<'static, LeafResult> + Send + Sync;

#[derive(Clone)]
pub enum TaskKind {
    Leaf(Arc<LeafFn>),
    Series(Vec<Task>),
    Parallel(Vec<Task>),
}

impl TaskKind {
    pub fn label(&self) -> &'static str {
        match self {
            TaskKind::Leaf(_) => "leaf",
            TaskKind::Series(_) => "series",
            TaskKind::Parallel(_) => "parallel",
        }
    }
}

struct TaskNode {
    name: TaskName,
    kind: TaskKind,
}

/// A named unit of build work.
///
/// Cloning is cheap and shares the node: a task is built once and the same
/// value is referenced from the lifecycle tree and from watch bindings.
/// Children can only be tasks that already exist, so a tree can never
/// contain itself.
#[derive(Clone)]
pub struct Task {
    inner: Arc<TaskNode>,
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("name", &self.inner.name)
            .field("kind", &self.inner.kind.label())
            .finish_non_exhaustive()
    }
}

impl Task {
    pub(crate) fn from_parts(name: TaskName, kind: TaskKind) -> Self {
        Self {
            inner: Arc::new(TaskNode { name, kind }),
        }
    }

    /// Asynchronous leaf.
    pub fn leaf<F, Fut>(name: impl Into<TaskName>, f: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = LeafResult> + Send + 'static,
    {
        let call: Arc<LeafFn> = Arc::new(move || f().boxed());
        Self::from_parts(name.into(), TaskKind::Leaf(call))
    }

    /// Leaf that completes synchronously on the calling scheduler thread.
    pub fn sync<F>(name: impl Into<TaskName>, f: F) -> Self
    where
        F: Fn() -> Result<Vec<PathBuf>, TransformError> + Send + Sync + 'static,
    {
        Self::leaf(name, move || {
            let result = f().map(LeafOutput::Complete);
            async move { result }
        })
    }

    /// Batch leaf whose body runs on the blocking pool (CPU-bound transforms).
    pub fn blocking<F>(name: impl Into<TaskName>, f: F) -> Self
    where
        F: Fn() -> Result<Vec<PathBuf>, TransformError> + Send + Sync + 'static,
    {
        let f = Arc::new(f);
        Self::leaf(name, move || {
            let f = Arc::clone(&f);
            async move {
                tokio::task::spawn_blocking(move || (*f)())
                    .await
                    .map_err(|e| TransformError::Failed(format!("worker panicked: {e}")))?
                    .map(LeafOutput::Complete)
            }
        })
    }

    /// Streaming leaf.
    pub fn streaming<F, S>(name: impl Into<TaskName>, f: F) -> Self
    where
        F: Fn() -> S + Send + Sync + 'static,
        S: Stream<Item = Result<PathBuf, TransformError>> + Send + 'static,
    {
        Self::leaf(name, move || {
            let stream = f().boxed();
            async move { Ok(LeafOutput::Streaming(stream)) }
        })
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn kind(&self) -> &TaskKind {
        &self.inner.kind
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self.inner.kind, TaskKind::Leaf(_))
    }

    /// Direct children (empty for leaves).
    pub fn children(&self) -> &[Task] {
        match &self.inner.kind {
            TaskKind::Leaf(_) => &[],
            TaskKind::Series(children) | TaskKind::Parallel(children) => children,
        }
    }

    /// Same work under a different name.
    pub fn renamed(&self, name: impl Into<TaskName>) -> Task {
        Self::from_parts(name.into(), self.inner.kind.clone())
    }

    /// Leaf names in depth-first listing order.
    pub fn leaf_names(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_leaf_names(&mut out);
        out
    }

    fn collect_leaf_names<'a>(&'a self, out: &mut Vec<&'a str>) {
        if self.is_leaf() {
            out.push(self.name());
        }
        for child in self.children() {
            child.collect_leaf_names(out);
        }
    }

    /// Indented tree rendering, used by `--dry-run`.
    pub fn render_tree(&self) -> String {
        let mut out = String::new();
        self.render_into(&mut out, 0);
        out
    }

    fn render_into(&self, out: &mut String, depth: usize) {
        let indent = "  ".repeat(depth);
        match &self.inner.kind {
            TaskKind::Leaf(_) => out.push_str(&format!("{indent}- {}\n", self.name())),
            kind => {
                out.push_str(&format!("{indent}- {} [{}]\n", self.name(), kind.label()));
                for child in self.children() {
                    child.render_into(out, depth + 1);
                }
            }
        }
    }

    pub(crate) fn ptr_eq(&self, other: &Task) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}
