// src/transform/sprite.rs

//! Icon sprite assembly: every icon becomes a `<symbol>` in one SVG.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::LazyLock;

use regex::Regex;

use crate::errors::TransformError;
use crate::transform::svg::minify_svg;
use crate::transform::{Output, SourceFile, Transform};

static ROOT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<svg\b([^>]*)>(.*)</svg>").expect("static regex"));
static VIEW_BOX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\bviewBox="([^"]*)""#).expect("static regex"));

#[derive(Debug, Clone)]
pub struct Sprite {
    dest_file: PathBuf,
}

impl Sprite {
    pub fn new(dest_file: impl Into<PathBuf>) -> Self {
        Self {
            dest_file: dest_file.into(),
        }
    }
}

fn symbol(file: &SourceFile) -> Result<String, TransformError> {
    let svg = minify_svg(&file.read_to_string()?);
    let caps = ROOT.captures(&svg).ok_or_else(|| TransformError::Syntax {
        path: file.path.clone(),
        message: "no <svg> root element".to_string(),
    })?;

    let attrs = caps.get(1).map_or("", |m| m.as_str());
    let body = caps.get(2).map_or("", |m| m.as_str());
    let view_box = VIEW_BOX
        .captures(attrs)
        .and_then(|c| c.get(1))
        .map(|m| format!(r#" viewBox="{}""#, m.as_str()))
        .unwrap_or_default();

    Ok(format!(r#"<symbol id="{}"{view_box}>{body}</symbol>"#, file.stem()))
}

impl Transform for Sprite {
    fn label(&self) -> &'static str {
        "sprite"
    }

    fn apply(&self, inputs: &[SourceFile]) -> Result<Vec<Output>, TransformError> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }

        let mut ids = BTreeSet::new();
        let mut out = String::from(r#"<svg xmlns="http://www.w3.org/2000/svg">"#);
        for file in inputs {
            if !ids.insert(file.stem()) {
                return Err(TransformError::Failed(format!(
                    "duplicate sprite icon id '{}' ({})",
                    file.stem(),
                    file.rel
                )));
            }
            out.push_str(&symbol(file)?);
        }
        out.push_str("</svg>");

        Ok(vec![Output::new(self.dest_file.clone(), out)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn icon(dir: &std::path::Path, rel: &str, body: &str) -> SourceFile {
        let path = dir.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, body).unwrap();
        SourceFile {
            rel: rel.into(),
            path,
        }
    }

    #[test]
    fn assembles_symbols() {
        let dir = tempfile::tempdir().unwrap();
        let cart = icon(
            dir.path(),
            "cart.svg",
            r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 24 24"><path d="M1 1"/></svg>"#,
        );
        let user = icon(dir.path(), "nested/user.svg", r#"<svg><circle r="4"/></svg>"#);

        let outputs = Sprite::new("img/sprite.svg").apply(&[cart, user]).unwrap();
        assert_eq!(outputs.len(), 1);
        assert_eq!(outputs[0].rel, PathBuf::from("img/sprite.svg"));
        assert_eq!(
            String::from_utf8(outputs[0].bytes.clone()).unwrap(),
            r#"<svg xmlns="http://www.w3.org/2000/svg"><symbol id="cart" viewBox="0 0 24 24"><path d="M1 1"/></symbol><symbol id="user"><circle r="4"/></symbol></svg>"#
        );
    }

    #[test]
    fn duplicate_ids_fail() {
        let dir = tempfile::tempdir().unwrap();
        let a = icon(dir.path(), "a/home.svg", "<svg></svg>");
        let b = icon(dir.path(), "b/home.svg", "<svg></svg>");
        assert!(Sprite::new("img/sprite.svg").apply(&[a, b]).is_err());
    }

    #[test]
    fn no_icons_no_sprite() {
        assert!(Sprite::new("img/sprite.svg").apply(&[]).unwrap().is_empty());
    }
}
