// src/transform/svg.rs

use std::path::PathBuf;
use std::sync::LazyLock;

use regex::Regex;

use crate::errors::TransformError;
use crate::transform::{Output, SourceFile, Transform};

static XML_DECL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<\?xml.*?\?>").expect("static regex"));
static DOCTYPE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?is)<!DOCTYPE[^>]*>").expect("static regex"));
static COMMENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").expect("static regex"));
static METADATA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<metadata\b.*?</metadata>").expect("static regex"));
static EDITOR_ATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\s(?:sodipodi|inkscape):[\w-]+="[^"]*""#).expect("static regex")
});
static BETWEEN_TAGS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r">\s+<").expect("static regex"));
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("static regex"));

/// Drop declarations, comments, editor metadata and insignificant
/// whitespace from an SVG document.
pub fn minify_svg(src: &str) -> String {
    let s = XML_DECL.replace_all(src, "");
    let s = DOCTYPE.replace_all(&s, "");
    let s = COMMENT.replace_all(&s, "");
    let s = METADATA.replace_all(&s, "");
    let s = EDITOR_ATTR.replace_all(&s, "");
    let s = BETWEEN_TAGS.replace_all(&s, "><");
    let s = WHITESPACE.replace_all(&s, " ");
    s.trim().to_string()
}

#[derive(Debug, Clone)]
pub struct SvgMinify {
    dest: PathBuf,
}

impl SvgMinify {
    pub fn new(dest: impl Into<PathBuf>) -> Self {
        Self { dest: dest.into() }
    }
}

impl Transform for SvgMinify {
    fn label(&self) -> &'static str {
        "svg"
    }

    fn apply(&self, inputs: &[SourceFile]) -> Result<Vec<Output>, TransformError> {
        inputs
            .iter()
            .map(|file| {
                let svg = minify_svg(&file.read_to_string()?);
                Ok(Output::new(self.dest.join(&file.rel), svg))
            })
            .collect()
    }
}
