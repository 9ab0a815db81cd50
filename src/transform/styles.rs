// src/transform/styles.rs

//! Sass compile, vendor prefixing and minification.

use std::path::PathBuf;

use lightningcss::stylesheet::{MinifyOptions, ParserOptions, PrinterOptions, StyleSheet};
use lightningcss::targets::{Browsers, Targets};
use parcel_sourcemap::SourceMap;

use crate::errors::TransformError;
use crate::transform::{Output, SourceFile, Transform};

/// Compiles each entry `<stem>.scss` to `dest/<stem>.min.css` plus a
/// `<stem>.min.css.map` next to it.
///
/// Partials are resolved relative to the entry file, so the entry must be
/// read from disk rather than from memory.
#[derive(Debug, Clone)]
pub struct Styles {
    dest: PathBuf,
    targets: Browsers,
}

/// Encode a browser version the way lightningcss expects.
const fn version(major: u32) -> Option<u32> {
    Some(major << 16)
}

/// Roughly "last two versions" of the evergreen browsers.
pub fn default_browsers() -> Browsers {
    Browsers {
        chrome: version(120),
        edge: version(120),
        firefox: version(115),
        safari: version(15),
        ios_saf: version(15),
        samsung: version(20),
        opera: version(100),
        android: version(120),
        ..Browsers::default()
    }
}

impl Styles {
    pub fn new(dest: impl Into<PathBuf>) -> Self {
        Self {
            dest: dest.into(),
            targets: default_browsers(),
        }
    }

    /// Minified CSS and its source map JSON.
    ///
    /// grass emits no map, so the map points into the compiled CSS, which
    /// is embedded as the source content.
    pub fn compile(&self, file: &SourceFile) -> Result<(String, String), TransformError> {
        let options = grass::Options::default().style(grass::OutputStyle::Expanded);
        let css = grass::from_path(&file.path, &options).map_err(|e| TransformError::Syntax {
            path: file.path.clone(),
            message: e.to_string(),
        })?;

        let syntax = |message: String| TransformError::Syntax {
            path: file.path.clone(),
            message,
        };

        let filename = format!("{}.css", file.stem());
        let mut map = SourceMap::new("/");
        let index = map.add_source(&filename);
        map.set_source_content(index as usize, &css)
            .map_err(|e| syntax(format!("source map: {e}")))?;

        let targets = Targets::from(self.targets);
        let mut sheet = StyleSheet::parse(
            &css,
            ParserOptions {
                filename,
                ..ParserOptions::default()
            },
        )
        .map_err(|e| syntax(e.to_string()))?;
        sheet
            .minify(MinifyOptions {
                targets,
                ..MinifyOptions::default()
            })
            .map_err(|e| syntax(e.to_string()))?;
        let printed = sheet
            .to_css(PrinterOptions {
                minify: true,
                source_map: Some(&mut map),
                targets,
                ..PrinterOptions::default()
            })
            .map_err(|e| syntax(e.to_string()))?;
        let json = map
            .to_json(Some("/source/"))
            .map_err(|e| syntax(format!("source map: {e}")))?;

        Ok((printed.code, json))
    }
}

impl Transform for Styles {
    fn label(&self) -> &'static str {
        "styles"
    }

    fn apply(&self, inputs: &[SourceFile]) -> Result<Vec<Output>, TransformError> {
        let mut outputs = Vec::with_capacity(inputs.len() * 2);
        for file in inputs {
            let (css, map) = self.compile(file)?;
            let name = format!("{}.min.css", file.stem());
            let css = format!("{css}\n/*# sourceMappingURL={name}.map */\n");
            outputs.push(Output::new(self.dest.join(&name), css));
            outputs.push(Output::new(self.dest.join(format!("{name}.map")), map));
        }
        Ok(outputs)
    }
}
