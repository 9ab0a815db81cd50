// src/config/model.rs

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Configuration exactly as read from `Sitebuild.toml`.
///
/// ```toml
/// [paths]
/// source = "source"
/// output = "build"
///
/// [server]
/// port = 3000
///
/// [watch]
/// debounce_ms = 150
///
/// [images]
/// jpeg_quality = 80
/// ```
///
/// All sections are optional and have reasonable defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    #[serde(default)]
    pub paths: PathsSection,
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub watch: WatchSection,
    #[serde(default)]
    pub images: ImagesSection,
}

/// `[paths]` section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PathsSection {
    /// Source tree root.
    #[serde(default = "default_source")]
    pub source: PathBuf,
    /// Output tree root. Removed entirely by `clean`.
    #[serde(default = "default_output")]
    pub output: PathBuf,
}

fn default_source() -> PathBuf {
    PathBuf::from("source")
}

fn default_output() -> PathBuf {
    PathBuf::from("build")
}

impl Default for PathsSection {
    fn default() -> Self {
        Self {
            source: default_source(),
            output: default_output(),
        }
    }
}

/// `[server]` section (dev only).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Accept cross-origin requests.
    #[serde(default = "default_true")]
    pub cors: bool,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_true() -> bool {
    true
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors: default_true(),
        }
    }
}

/// `[watch]` section (dev only).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WatchSection {
    /// Per-binding coalescing window in milliseconds.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    /// Skip re-runs when the watched content hash did not change.
    #[serde(default)]
    pub use_hash: bool,
}

fn default_debounce_ms() -> u64 {
    150
}

impl Default for WatchSection {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            use_hash: false,
        }
    }
}

/// `[images]` section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ImagesSection {
    /// Release-mode JPEG recompression quality (1-100).
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,
    /// AVIF quality (1-100).
    #[serde(default = "default_avif_quality")]
    pub avif_quality: u8,
    /// AVIF encoder speed (1-10, higher is faster).
    #[serde(default = "default_avif_speed")]
    pub avif_speed: u8,
}

fn default_jpeg_quality() -> u8 {
    80
}

fn default_avif_quality() -> u8 {
    60
}

fn default_avif_speed() -> u8 {
    8
}

impl Default for ImagesSection {
    fn default() -> Self {
        Self {
            jpeg_quality: default_jpeg_quality(),
            avif_quality: default_avif_quality(),
            avif_speed: default_avif_speed(),
        }
    }
}

/// Validated configuration.
///
/// Only obtainable through `TryFrom<RawConfigFile>` (or `Default`), so every
/// value the rest of the crate sees has passed validation.
#[derive(Debug, Clone, Default)]
pub struct ConfigFile {
    paths: PathsSection,
    server: ServerSection,
    watch: WatchSection,
    images: ImagesSection,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(raw: RawConfigFile) -> Self {
        Self {
            paths: raw.paths,
            server: raw.server,
            watch: raw.watch,
            images: raw.images,
        }
    }

    pub fn source_dir(&self) -> &Path {
        &self.paths.source
    }

    pub fn output_dir(&self) -> &Path {
        &self.paths.output
    }

    pub fn server(&self) -> &ServerSection {
        &self.server
    }

    pub fn watch(&self) -> &WatchSection {
        &self.watch
    }

    pub fn images(&self) -> &ImagesSection {
        &self.images
    }

    /// Override the preview port (`--port`).
    pub fn with_port(mut self, port: u16) -> Self {
        self.server.port = port;
        self
    }
}
