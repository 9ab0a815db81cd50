// src/transform/copy.rs

use std::path::PathBuf;

use crate::errors::TransformError;
use crate::transform::{Output, SourceFile, Transform};

/// Verbatim copy to `dest/<rel>`.
#[derive(Debug, Clone)]
pub struct CopyFiles {
    dest: PathBuf,
}

impl CopyFiles {
    pub fn new(dest: impl Into<PathBuf>) -> Self {
        Self { dest: dest.into() }
    }
}

impl Transform for CopyFiles {
    fn label(&self) -> &'static str {
        "copy"
    }

    fn apply(&self, inputs: &[SourceFile]) -> Result<Vec<Output>, TransformError> {
        inputs
            .iter()
            .map(|file| Ok(Output::new(self.dest.join(&file.rel), file.read()?)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_relative_layout() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("fonts")).unwrap();
        let path = dir.path().join("fonts/a.woff2");
        std::fs::write(&path, [0u8, 1, 2]).unwrap();

        let outputs = CopyFiles::new("")
            .apply(&[SourceFile {
                rel: "fonts/a.woff2".into(),
                path,
            }])
            .unwrap();
        assert_eq!(outputs, vec![Output::new("fonts/a.woff2", vec![0u8, 1, 2])]);
    }
}
