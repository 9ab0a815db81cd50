// src/task/compose.rs

//! Series and parallel composition.
//!
//! Composition only accepts existing [`Task`] values, so a tree can never
//! reference a task by name or contain a cycle.

use std::sync::Arc;

use tracing::error;

use crate::errors::CompositionError;
use crate::server::LiveReload;
use crate::task::runner;
use crate::task::{LeafOutput, Task, TaskKind};

/// Children run strictly in listed order; the first failure stops the rest.
pub fn series<I>(tasks: I) -> Result<Task, CompositionError>
where
    I: IntoIterator<Item = Task>,
{
    compose("series", tasks, TaskKind::Series)
}

/// Children start together; the composite waits for all of them.
pub fn parallel<I>(tasks: I) -> Result<Task, CompositionError>
where
    I: IntoIterator<Item = Task>,
{
    compose("parallel", tasks, TaskKind::Parallel)
}

fn compose<I>(
    kind: &'static str,
    tasks: I,
    build: fn(Vec<Task>) -> TaskKind,
) -> Result<Task, CompositionError>
where
    I: IntoIterator<Item = Task>,
{
    let children: Vec<Task> = tasks.into_iter().collect();
    if children.is_empty() {
        return Err(CompositionError::EmptyComposition { kind });
    }

    let names: Vec<&str> = children.iter().map(Task::name).collect();
    let name = format!("{kind}({})", names.join(", "));
    Ok(Task::from_parts(name, build(children)))
}

/// Wrap `task` so a failure inside it is logged, pushed to preview clients
/// and reported upward as success.
///
/// Used for dev-mode tasks whose errors must not stop the watcher.
pub fn recoverable(task: Task, live: Arc<dyn LiveReload>) -> Task {
    let name = task.name().to_string();
    Task::leaf(name, move || {
        let inner = task.clone();
        let live = Arc::clone(&live);
        async move {
            match runner::run(&inner).await {
                Ok(report) => Ok(LeafOutput::Complete(report.outputs())),
                Err(failure) => {
                    error!(
                        task = %failure.task,
                        error = %failure.source,
                        "recoverable task failed; keeping last good output"
                    );
                    live.build_error(&failure.task, &failure.source.to_string());
                    Ok(LeafOutput::Complete(Vec::new()))
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop(name: &str) -> Task {
        Task::sync(name, || Ok(Vec::new()))
    }

    #[test]
    fn empty_series_is_rejected() {
        let err = series(Vec::new()).unwrap_err();
        assert_eq!(err, CompositionError::EmptyComposition { kind: "series" });
    }

    #[test]
    fn empty_parallel_is_rejected() {
        let err = parallel(std::iter::empty()).unwrap_err();
        assert_eq!(err, CompositionError::EmptyComposition { kind: "parallel" });
    }

    #[test]
    fn composite_names_list_children() {
        let task = series([noop("clean"), noop("copy")]).unwrap();
        assert_eq!(task.name(), "series(clean, copy)");
        assert_eq!(task.children().len(), 2);
        assert!(!task.is_leaf());
    }
}
