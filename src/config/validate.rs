// src/config/validate.rs

use std::path::{Component, Path, PathBuf};

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{Result, SitebuildError};

const MAX_DEBOUNCE_MS: u64 = 10_000;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = SitebuildError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_paths(cfg)?;
    validate_server(cfg)?;
    validate_watch(cfg)?;
    validate_images(cfg)?;
    Ok(())
}

fn config_error(msg: impl Into<String>) -> SitebuildError {
    SitebuildError::ConfigError(msg.into())
}

fn validate_paths(cfg: &RawConfigFile) -> Result<()> {
    let source = normalize(&cfg.paths.source);
    let output = normalize(&cfg.paths.output);

    if source == output {
        return Err(config_error(format!(
            "[paths].source and [paths].output are the same directory ({:?})",
            cfg.paths.source
        )));
    }
    if source.starts_with(&output) {
        return Err(config_error(format!(
            "[paths].output ({:?}) contains [paths].source ({:?}); clean would delete the sources",
            cfg.paths.output, cfg.paths.source
        )));
    }
    Ok(())
}

fn validate_server(cfg: &RawConfigFile) -> Result<()> {
    if cfg.server.host.trim().is_empty() {
        return Err(config_error("[server].host must not be empty"));
    }
    Ok(())
}

fn validate_watch(cfg: &RawConfigFile) -> Result<()> {
    if cfg.watch.debounce_ms > MAX_DEBOUNCE_MS {
        return Err(config_error(format!(
            "[watch].debounce_ms must be <= {MAX_DEBOUNCE_MS} (got {})",
            cfg.watch.debounce_ms
        )));
    }
    Ok(())
}

fn validate_images(cfg: &RawConfigFile) -> Result<()> {
    let images = &cfg.images;
    for (key, value) in [
        ("jpeg_quality", images.jpeg_quality),
        ("avif_quality", images.avif_quality),
    ] {
        if !(1..=100).contains(&value) {
            return Err(config_error(format!(
                "[images].{key} must be between 1 and 100 (got {value})"
            )));
        }
    }
    if !(1..=10).contains(&images.avif_speed) {
        return Err(config_error(format!(
            "[images].avif_speed must be between 1 and 10 (got {})",
            images.avif_speed
        )));
    }
    Ok(())
}

/// Lexical normalization: drops `.` components and resolves `..` where a
/// preceding normal component exists.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
