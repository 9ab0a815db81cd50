// src/transform/mod.rs

//! Content transforms and the tasks that run them.
//!
//! A [`Transform`] is pure: it maps input files to output bytes at paths
//! relative to the output root. Writing is done by the task wrappers in
//! this module, so parallel tasks only ever touch their own output paths.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_stream::stream;
use tracing::{debug, info};

use crate::errors::TransformError;
use crate::server::LiveReload;
use crate::task::{LeafOutput, Task};

pub mod copy;
pub mod images;
pub mod markup;
pub mod scripts;
pub mod source;
pub mod sprite;
pub mod styles;
pub mod svg;

pub use copy::CopyFiles;
pub use images::{Avif, RasterOptimize, Webp};
pub use markup::Markup;
pub use scripts::Scripts;
pub use source::{SourceFile, SourceSet};
pub use sprite::Sprite;
pub use styles::Styles;
pub use svg::SvgMinify;

/// A produced file, relative to the output root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Output {
    pub rel: PathBuf,
    pub bytes: Vec<u8>,
}

impl Output {
    pub fn new(rel: impl Into<PathBuf>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            rel: rel.into(),
            bytes: bytes.into(),
        }
    }
}

pub trait Transform: Send + Sync {
    /// Short label for logs.
    fn label(&self) -> &'static str;

    fn apply(&self, inputs: &[SourceFile]) -> Result<Vec<Output>, TransformError>;
}

/// Write outputs under `out_root`, creating directories as needed.
pub fn write_outputs(out_root: &Path, outputs: Vec<Output>) -> Result<Vec<PathBuf>, TransformError> {
    let mut written = Vec::with_capacity(outputs.len());
    for output in outputs {
        let dest = out_root.join(&output.rel);
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent).map_err(|e| TransformError::io(parent, e))?;
        }
        std::fs::write(&dest, &output.bytes).map_err(|e| TransformError::io(&dest, e))?;
        debug!(path = %dest.display(), bytes = output.bytes.len(), "wrote output");
        written.push(dest);
    }
    Ok(written)
}

/// Batch task: completes once every output is written. Runs on the
/// blocking pool.
pub fn batch_task(
    name: &str,
    sources: SourceSet,
    transform: Arc<dyn Transform>,
    out_root: PathBuf,
) -> Task {
    Task::blocking(name, move || {
        let inputs = sources.collect()?;
        debug!(transform = transform.label(), inputs = inputs.len(), "collected inputs");
        let outputs = transform.apply(&inputs)?;
        write_outputs(&out_root, outputs)
    })
}

/// Streaming task: each input is transformed and written on its own, and
/// every written path is emitted as soon as it exists. At end of stream the
/// written paths are passed to `live.notify`.
pub fn streaming_task(
    name: &str,
    sources: SourceSet,
    transform: Arc<dyn Transform>,
    out_root: PathBuf,
    live: Arc<dyn LiveReload>,
) -> Task {
    Task::streaming(name, move || {
        let sources = sources.clone();
        let transform = Arc::clone(&transform);
        let out_root = out_root.clone();
        let live = Arc::clone(&live);

        stream! {
            let mut written = Vec::new();
            match blocking(move || sources.collect()).await {
                Err(err) => {
                    yield Err(err);
                }
                Ok(inputs) => {
                    for input in inputs {
                        let transform = Arc::clone(&transform);
                        let out_root = out_root.clone();
                        let result = blocking(move || {
                            let outputs = transform.apply(std::slice::from_ref(&input))?;
                            write_outputs(&out_root, outputs)
                        })
                        .await;

                        match result {
                            Ok(paths) => {
                                for path in paths {
                                    written.push(path.clone());
                                    yield Ok(path);
                                }
                            }
                            Err(err) => {
                                yield Err(err);
                            }
                        }
                    }
                }
            }

            live.notify(&written);
        }
    })
}

async fn blocking<T, F>(f: F) -> Result<T, TransformError>
where
    F: FnOnce() -> Result<T, TransformError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| TransformError::Failed(format!("worker panicked: {e}")))?
}

/// Remove the whole output tree, then recreate it empty.
pub fn clean_task(out_root: PathBuf) -> Task {
    Task::leaf("clean", move || {
        let out_root = out_root.clone();
        async move {
            match tokio::fs::remove_dir_all(&out_root).await {
                Ok(()) => info!("removed {}", out_root.display()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(TransformError::io(&out_root, e)),
            }
            tokio::fs::create_dir_all(&out_root)
                .await
                .map_err(|e| TransformError::io(&out_root, e))?;
            Ok(LeafOutput::Complete(Vec::new()))
        }
    })
}

/// `dir/<stem>.<ext>` for a `/`-separated relative path.
pub(crate) fn with_extension(dest: &Path, rel: &str, ext: &str) -> PathBuf {
    dest.join(rel).with_extension(ext)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task;

    struct Upper;

    impl Transform for Upper {
        fn label(&self) -> &'static str {
            "upper"
        }

        fn apply(&self, inputs: &[SourceFile]) -> Result<Vec<Output>, TransformError> {
            inputs
                .iter()
                .map(|f| Ok(Output::new(&f.rel, f.read_to_string()?.to_uppercase())))
                .collect()
        }
    }

    #[tokio::test]
    async fn batch_task_writes_outputs() {
        let src = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        std::fs::write(src.path().join("a.txt"), "hello").unwrap();

        let sources = SourceSet::new(src.path(), &["*.txt"]).unwrap();
        let t = batch_task("upper", sources, Arc::new(Upper), out.path().to_path_buf());
        let report = task::run(&t).await.unwrap();

        assert_eq!(report.outputs(), vec![out.path().join("a.txt")]);
        assert_eq!(std::fs::read_to_string(out.path().join("a.txt")).unwrap(), "HELLO");
    }

    #[tokio::test]
    async fn clean_removes_previous_tree() {
        let out = tempfile::tempdir().unwrap();
        let root = out.path().join("build");
        std::fs::create_dir_all(root.join("css")).unwrap();
        std::fs::write(root.join("css/old.css"), "x").unwrap();

        task::run(&clean_task(root.clone())).await.unwrap();
        assert!(root.is_dir());
        assert_eq!(std::fs::read_dir(&root).unwrap().count(), 0);
    }

    #[test]
    fn with_extension_keeps_subdirectories() {
        assert_eq!(
            with_extension(Path::new("img"), "photos/cat.jpg", "avif"),
            PathBuf::from("img/photos/cat.avif")
        );
    }
}
