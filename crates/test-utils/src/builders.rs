#![allow(dead_code)]

use std::path::Path;

use sitebuild::config::{ConfigFile, RawConfigFile};

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile::default(),
        }
    }

    /// Source at `<root>/source`, output at `<root>/build`.
    pub fn rooted_at(root: &Path) -> Self {
        Self::new()
            .with_source(&root.join("source"))
            .with_output(&root.join("build"))
    }

    pub fn with_source(mut self, path: &Path) -> Self {
        self.config.paths.source = path.to_path_buf();
        self
    }

    pub fn with_output(mut self, path: &Path) -> Self {
        self.config.paths.output = path.to_path_buf();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.config.server.port = port;
        self
    }

    pub fn with_debounce_ms(mut self, ms: u64) -> Self {
        self.config.watch.debounce_ms = ms;
        self
    }

    pub fn with_use_hash(mut self, val: bool) -> Self {
        self.config.watch.use_hash = val;
        self
    }

    pub fn with_jpeg_quality(mut self, q: u8) -> Self {
        self.config.images.jpeg_quality = q;
        self
    }

    /// Fastest AVIF settings, for tests that only check files exist.
    pub fn with_fast_avif(mut self) -> Self {
        self.config.images.avif_speed = 10;
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}
