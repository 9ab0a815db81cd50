#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// A throwaway project: `<tmp>/source` plus an (initially absent)
/// `<tmp>/build`.
pub struct SourceTree {
    dir: TempDir,
}

impl SourceTree {
    pub fn empty() -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::create_dir_all(dir.path().join("source")).expect("create source");
        Self { dir }
    }

    /// A small but complete site: styles with a partial, one script, one
    /// page, one photo, one plain SVG and one sprite icon.
    pub fn site() -> Self {
        let tree = Self::empty();
        tree.write(
            "sass/style.scss",
            "@import 'colors';\nbody { color: $ink; }\n",
        );
        tree.write("sass/_colors.scss", "$ink: #333333;\n");
        tree.write(
            "js/app.js",
            "// greet\nfunction greet(name) {\n  return 'hi ' + name;\n}\nlet count = 0;\nconst half = count++ / 2;\n",
        );
        tree.write(
            "index.html",
            "<!DOCTYPE html>\n<html>\n  <head><title>Home</title></head>\n  <body>\n    <p>Hello</p>\n  </body>\n</html>\n",
        );
        tree.write(
            "img/logo.svg",
            "<?xml version=\"1.0\"?>\n<!-- logo -->\n<svg xmlns=\"http://www.w3.org/2000/svg\" viewBox=\"0 0 10 10\">\n  <rect width=\"10\" height=\"10\"/>\n</svg>\n",
        );
        tree.write(
            "img/sprite-icons/star.svg",
            "<svg xmlns=\"http://www.w3.org/2000/svg\" viewBox=\"0 0 24 24\"><path d=\"M12 2l3 7h7l-6 5 2 7-6-4-6 4 2-7-6-5h7z\"/></svg>",
        );
        tree.write_jpeg("img/photo.jpg", 16, 12);
        tree
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn source(&self) -> PathBuf {
        self.dir.path().join("source")
    }

    pub fn output(&self) -> PathBuf {
        self.dir.path().join("build")
    }

    /// Write `contents` to `source/<rel>`, creating parent directories.
    pub fn write(&self, rel: &str, contents: &str) -> PathBuf {
        let path = self.source().join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent");
        }
        fs::write(&path, contents).expect("write source file");
        path
    }

    /// Write a small gradient JPEG to `source/<rel>`.
    pub fn write_jpeg(&self, rel: &str, width: u32, height: u32) -> PathBuf {
        let path = self.source().join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent");
        }
        let img = image::RgbImage::from_fn(width, height, |x, y| {
            image::Rgb([(x * 16) as u8, (y * 16) as u8, 128])
        });
        img.save(&path).expect("encode jpeg");
        path
    }

    pub fn output_file(&self, rel: &str) -> PathBuf {
        self.output().join(rel)
    }

    pub fn read_output(&self, rel: &str) -> String {
        fs::read_to_string(self.output_file(rel)).expect("read output file")
    }
}
