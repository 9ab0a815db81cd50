// src/transform/markup.rs

use std::path::PathBuf;

use minify_html::{minify, Cfg};

use crate::errors::TransformError;
use crate::transform::{Output, SourceFile, Transform};

/// Whitespace-collapsing HTML minifier.
///
/// Closing tags are kept so the preview server can still find `</body>`.
#[derive(Debug, Clone)]
pub struct Markup {
    dest: PathBuf,
}

impl Markup {
    pub fn new(dest: impl Into<PathBuf>) -> Self {
        Self { dest: dest.into() }
    }
}

fn config() -> Cfg {
    let mut cfg = Cfg::new();
    cfg.keep_closing_tags = true;
    cfg.keep_html_and_head_opening_tags = true;
    cfg.do_not_minify_doctype = true;
    cfg.ensure_spec_compliant_unquoted_attribute_values = true;
    cfg.keep_spaces_between_attributes = true;
    cfg
}

impl Transform for Markup {
    fn label(&self) -> &'static str {
        "html"
    }

    fn apply(&self, inputs: &[SourceFile]) -> Result<Vec<Output>, TransformError> {
        let cfg = config();
        inputs
            .iter()
            .map(|file| {
                let html = file.read()?;
                Ok(Output::new(self.dest.join(&file.rel), minify(&html, &cfg)))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_whitespace_and_keeps_body_close() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.html");
        std::fs::write(
            &path,
            "<!DOCTYPE html>\n<html>\n  <head>\n    <title>Hi</title>\n  </head>\n  <body>\n    <p>\n      hello\n    </p>\n  </body>\n</html>\n",
        )
        .unwrap();

        let outputs = Markup::new("")
            .apply(&[SourceFile {
                rel: "index.html".into(),
                path,
            }])
            .unwrap();
        let html = String::from_utf8(outputs[0].bytes.clone()).unwrap();
        assert!(html.contains("</body>"));
        assert!(!html.contains("\n    "));
        assert_eq!(outputs[0].rel, PathBuf::from("index.html"));
    }
}
