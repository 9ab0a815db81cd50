// src/transform/scripts.rs

//! Conservative script minification: comments and redundant whitespace go,
//! line structure stays so automatic semicolon insertion is unaffected.
//!
//! Every surviving line starts from exactly one source line, so the source
//! map written next to each script is line granular.

use std::iter::Peekable;
use std::path::{Path, PathBuf};
use std::str::Chars;

use parcel_sourcemap::{OriginalLocation, SourceMap};

use crate::errors::TransformError;
use crate::transform::{Output, SourceFile, Transform};

#[derive(Debug, Clone)]
pub struct Scripts {
    dest: PathBuf,
}

impl Scripts {
    pub fn new(dest: impl Into<PathBuf>) -> Self {
        Self { dest: dest.into() }
    }
}

impl Transform for Scripts {
    fn label(&self) -> &'static str {
        "scripts"
    }

    fn apply(&self, inputs: &[SourceFile]) -> Result<Vec<Output>, TransformError> {
        let mut outputs = Vec::with_capacity(inputs.len() * 2);
        for file in inputs {
            let syntax = |message: String| TransformError::Syntax {
                path: file.path.clone(),
                message,
            };
            let src = file.read_to_string()?;
            let minified = minify_js_mapped(&src).map_err(syntax)?;
            let map = line_map(&file.rel, &src, &minified).map_err(syntax)?;

            let name = Path::new(&file.rel)
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let rel = self.dest.join(&file.rel);
            let map_rel = rel.with_file_name(format!("{name}.map"));
            let code = format!("{}\n//# sourceMappingURL={name}.map\n", minified.code);

            outputs.push(Output::new(rel, code));
            outputs.push(Output::new(map_rel, map));
        }
        Ok(outputs)
    }
}

/// Source map JSON pointing each output line at the line it came from.
fn line_map(source: &str, src: &str, minified: &Minified) -> Result<String, String> {
    let mut map = SourceMap::new("/");
    let index = map.add_source(source);
    map.set_source_content(index as usize, src)
        .map_err(|e| format!("source map: {e}"))?;

    let src_lines: Vec<&str> = src.lines().collect();
    let generated = minified.code.lines().count();
    for (line, &original) in minified.lines.iter().enumerate().take(generated) {
        let indent = src_lines
            .get(original as usize)
            .map_or(0, |l| l.len() - l.trim_start().len());
        map.add_mapping(
            line as u32,
            0,
            Some(OriginalLocation {
                original_line: original,
                original_column: indent as u32,
                source: index,
                name: None,
            }),
        );
    }

    map.to_json(Some("/source/"))
        .map_err(|e| format!("source map: {e}"))
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mode {
    Code,
    Str(char),
    Template,
    Regex { in_class: bool },
    LineComment,
    BlockComment,
}

/// Minified code plus the zero-based source line each output line starts on.
#[derive(Debug, Default)]
pub struct Minified {
    pub code: String,
    pub lines: Vec<u32>,
}

impl Minified {
    fn push(&mut self, c: char, line: u32) {
        if self.code.is_empty() || self.code.ends_with('\n') {
            self.lines.push(line);
        }
        self.code.push(c);
    }

    fn newline(&mut self) {
        trim_trailing(&mut self.code);
        if !self.code.is_empty() && !self.code.ends_with('\n') {
            self.code.push('\n');
        }
    }
}

/// Strip comments, trim lines, collapse blank lines and runs of spaces.
///
/// Strings, template literals and regex literals are copied untouched. A
/// `/` starts a regex literal when the previous significant character
/// cannot end an expression.
pub fn minify_js(src: &str) -> Result<String, String> {
    minify_js_mapped(src).map(|m| m.code)
}

pub fn minify_js_mapped(src: &str) -> Result<Minified, String> {
    let mut out = Minified {
        code: String::with_capacity(src.len()),
        lines: Vec::new(),
    };
    let mut mode = Mode::Code;
    let mut chars = src.chars().peekable();
    let mut prev_sig: Option<char> = None;
    let mut pending_space = false;
    let mut line = 0u32;

    while let Some(c) = chars.next() {
        let at = line;
        if c == '\n' {
            line += 1;
        }

        match mode {
            Mode::Code => match c {
                '/' if chars.peek() == Some(&'/') => {
                    chars.next();
                    mode = Mode::LineComment;
                }
                '/' if chars.peek() == Some(&'*') => {
                    chars.next();
                    mode = Mode::BlockComment;
                    pending_space = true;
                }
                '\n' => {
                    out.newline();
                    pending_space = false;
                }
                c if c.is_whitespace() => pending_space = true,
                _ => {
                    if pending_space && !out.code.is_empty() && !out.code.ends_with('\n') {
                        out.push(' ', at);
                    }
                    pending_space = false;
                    out.push(c, at);
                    mode = match c {
                        '"' | '\'' => Mode::Str(c),
                        '`' => Mode::Template,
                        '/' if regex_allowed(prev_sig, &out.code) => Mode::Regex { in_class: false },
                        _ => Mode::Code,
                    };
                    prev_sig = Some(c);
                }
            },
            Mode::Str(quote) => {
                out.push(c, at);
                if c == '\\' {
                    copy_escaped(&mut out, &mut chars, &mut line, at);
                } else if c == quote {
                    mode = Mode::Code;
                } else if c == '\n' {
                    return Err("unterminated string literal".to_string());
                }
            }
            Mode::Template => {
                out.push(c, at);
                if c == '\\' {
                    copy_escaped(&mut out, &mut chars, &mut line, at);
                } else if c == '`' {
                    mode = Mode::Code;
                    prev_sig = Some('`');
                }
            }
            Mode::Regex { in_class } => {
                out.push(c, at);
                match c {
                    '\\' => copy_escaped(&mut out, &mut chars, &mut line, at),
                    '[' => mode = Mode::Regex { in_class: true },
                    ']' => mode = Mode::Regex { in_class: false },
                    '/' if !in_class => {
                        mode = Mode::Code;
                        prev_sig = Some('/');
                    }
                    '\n' => return Err("unterminated regular expression".to_string()),
                    _ => {}
                }
            }
            Mode::LineComment => {
                if c == '\n' {
                    out.newline();
                    mode = Mode::Code;
                    pending_space = false;
                }
            }
            Mode::BlockComment => {
                if c == '*' && chars.peek() == Some(&'/') {
                    chars.next();
                    mode = Mode::Code;
                }
            }
        }
    }

    match mode {
        Mode::Str(_) => return Err("unterminated string literal".to_string()),
        Mode::Template => return Err("unterminated template literal".to_string()),
        Mode::BlockComment => return Err("unterminated block comment".to_string()),
        _ => {}
    }

    let len = out.code.trim_end().len();
    out.code.truncate(len);
    Ok(out)
}

/// Copy the character after a backslash verbatim.
fn copy_escaped(out: &mut Minified, chars: &mut Peekable<Chars<'_>>, line: &mut u32, at: u32) {
    if let Some(next) = chars.next() {
        if next == '\n' {
            *line += 1;
        }
        out.push(next, at);
    }
}

fn trim_trailing(out: &mut String) {
    while out.ends_with([' ', '\t']) {
        out.pop();
    }
}

/// `out` already contains the `/` being classified.
fn regex_allowed(prev_sig: Option<char>, out: &str) -> bool {
    let before = out[..out.len() - 1].trim_end();
    match prev_sig {
        None => true,
        // A postfix `++`/`--` ends an expression, so what follows divides.
        Some('+' | '-') if before.ends_with("++") || before.ends_with("--") => false,
        Some(c) if "(,=:[!&|?{};+-*%<>~^\n".contains(c) => true,
        Some(c) if c.is_alphanumeric() || c == '_' || c == '$' => {
            let word: String = before
                .chars()
                .rev()
                .take_while(|ch| ch.is_alphanumeric() || *ch == '_' || *ch == '$')
                .collect::<Vec<_>>()
                .into_iter()
                .rev()
                .collect();
            matches!(
                word.as_str(),
                "return" | "typeof" | "case" | "do" | "else" | "in" | "of" | "void" | "yield"
            )
        }
        Some(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_comments_and_blank_lines() {
        let src = "// header\nconst a = 1;   // trailing\n\n\n/* block */ let   b = 2;\n";
        assert_eq!(minify_js(src).unwrap(), "const a = 1;\nlet b = 2;");
    }

    #[test]
    fn strings_are_untouched() {
        let src = "const url = \"http://x.test/*not*/\";\nconst s = '  two  spaces ';";
        assert_eq!(minify_js(src).unwrap(), src);
    }

    #[test]
    fn regex_with_slashes_survives() {
        let src = "const re = /a\\/\\//g; // trailing\nconst d = 4 / 2;";
        assert_eq!(minify_js(src).unwrap(), "const re = /a\\/\\//g;\nconst d = 4 / 2;");
    }

    #[test]
    fn division_after_postfix_update_is_not_a_regex() {
        let src = "let i = 0;\nconst avg = i++ / 2;\nconst b = i-- /2;";
        assert_eq!(minify_js(src).unwrap(), src);
    }

    #[test]
    fn regex_after_binary_plus_is_still_a_regex() {
        let src = "const s = '' + /a b/.source;";
        assert_eq!(minify_js(src).unwrap(), src);
    }

    #[test]
    fn template_literal_keeps_newlines() {
        let src = "const t = `line one\n   line two`;";
        assert_eq!(minify_js(src).unwrap(), src);
    }

    #[test]
    fn unterminated_string_is_an_error() {
        assert!(minify_js("const s = 'oops;\n").is_err());
    }

    #[test]
    fn output_lines_remember_their_source_line() {
        let src = "// header\n\nconst a = 1;\n\n    let b = `x\ny`;\n";
        let minified = minify_js_mapped(src).unwrap();
        assert_eq!(minified.code, "const a = 1;\nlet b = `x\ny`;");
        assert_eq!(minified.lines, vec![2, 4, 5]);
    }

    #[test]
    fn apply_writes_script_and_source_map() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.js");
        std::fs::write(&path, "// greet\nconst greet = () => 1;\n").unwrap();
        let file = SourceFile {
            rel: "app.js".into(),
            path,
        };

        let outputs = Scripts::new("js").apply(&[file]).unwrap();
        let rels: Vec<_> = outputs.iter().map(|o| o.rel.clone()).collect();
        assert_eq!(rels, vec![PathBuf::from("js/app.js"), PathBuf::from("js/app.js.map")]);

        let code = String::from_utf8(outputs[0].bytes.clone()).unwrap();
        assert!(code.ends_with("//# sourceMappingURL=app.js.map\n"), "got {code}");
        let map = String::from_utf8(outputs[1].bytes.clone()).unwrap();
        assert!(map.contains("\"mappings\""), "got {map}");
        assert!(map.contains("app.js"), "got {map}");
    }
}
