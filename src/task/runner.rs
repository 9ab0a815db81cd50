// src/task/runner.rs

//! Executes a task tree.

use std::path::PathBuf;
use std::time::Instant;

use futures::future::BoxFuture;
use futures::stream::{BoxStream, FuturesUnordered, StreamExt};
use futures::FutureExt;
use tracing::{debug, error, info};

use crate::errors::{RunFailure, TransformError};
use crate::task::{BuildReport, BuildRun, LeafFn, LeafOutput, Task, TaskKind};

/// Run `task` to completion.
///
/// Returns the run report on success, or the first failure observed with
/// the name of the leaf it came from.
pub async fn run(task: &Task) -> Result<BuildReport, RunFailure> {
    let build = BuildRun::new(task);
    let run_id = build.run_id();
    debug!(run_id, task = %task.name(), "starting build run");

    let outcome = run_node(task, &build).await;
    let report = build.finish();
    let elapsed_ms = report.elapsed.as_millis() as u64;

    match outcome {
        Ok(()) => {
            debug!(run_id, task = %task.name(), elapsed_ms, "build run succeeded");
            Ok(report)
        }
        Err(failure) => {
            debug!(run_id, task = %task.name(), elapsed_ms, failed = %failure.task, "build run failed");
            Err(failure)
        }
    }
}

fn run_node<'a>(task: &'a Task, build: &'a BuildRun) -> BoxFuture<'a, Result<(), RunFailure>> {
    async move {
        match task.kind() {
            TaskKind::Leaf(call) => run_leaf(task.name(), call.as_ref(), build).await,
            TaskKind::Series(children) => {
                for child in children {
                    run_node(child, build).await?;
                }
                Ok(())
            }
            TaskKind::Parallel(children) => {
                let mut running: FuturesUnordered<_> =
                    children.iter().map(|child| run_node(child, build)).collect();

                // Drain every child; the first failure wins.
                let mut first_failure = None;
                while let Some(result) = running.next().await {
                    if let Err(failure) = result {
                        match first_failure {
                            None => first_failure = Some(failure),
                            Some(_) => debug!(task = %failure.task, "additional parallel failure"),
                        }
                    }
                }

                match first_failure {
                    Some(failure) => Err(failure),
                    None => Ok(()),
                }
            }
        }
    }
    .boxed()
}

async fn run_leaf(name: &str, call: &LeafFn, build: &BuildRun) -> Result<(), RunFailure> {
    build.mark_running(name);
    info!(task = %name, "starting task");
    let started = Instant::now();

    let result = match call().await {
        Ok(LeafOutput::Complete(files)) => Ok(files),
        Ok(LeafOutput::Streaming(stream)) => drain(name, stream).await,
        Err(err) => Err(err),
    };

    let elapsed = started.elapsed();
    let elapsed_ms = elapsed.as_millis() as u64;

    match result {
        Ok(files) => {
            info!(task = %name, elapsed_ms, outputs = files.len(), "finished task");
            build.mark_succeeded(name, files, elapsed);
            Ok(())
        }
        Err(source) => {
            error!(task = %name, elapsed_ms, error = %source, "task failed");
            build.mark_failed(name, source.to_string(), elapsed);
            Err(RunFailure {
                task: name.to_string(),
                source,
            })
        }
    }
}

/// A streaming leaf is done at end of stream, not at its first item.
async fn drain(
    name: &str,
    mut stream: BoxStream<'static, Result<PathBuf, TransformError>>,
) -> Result<Vec<PathBuf>, TransformError> {
    let mut files = Vec::new();
    let mut first_error = None;

    while let Some(item) = stream.next().await {
        match item {
            Ok(path) => {
                debug!(task = %name, path = %path.display(), "wrote output");
                files.push(path);
            }
            Err(err) if first_error.is_none() => first_error = Some(err),
            Err(err) => debug!(task = %name, error = %err, "additional stream error"),
        }
    }

    match first_error {
        Some(err) => Err(err),
        None => Ok(files),
    }
}
