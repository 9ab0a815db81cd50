// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::Result;

/// Load a configuration file from a given path and return the raw `RawConfigFile`.
///
/// This only performs TOML deserialization; it does **not** perform semantic
/// validation. Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawConfigFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Load a configuration file from path and validate it.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let raw_config = load_from_path(&path)?;
    let config = ConfigFile::try_from(raw_config)?;
    Ok(config)
}

/// Resolve the configuration the CLI should use.
///
/// - An explicit path must exist.
/// - Otherwise `Sitebuild.toml` is used when present, built-in defaults
///   when not.
pub fn load_for_cli(explicit: Option<&Path>) -> Result<ConfigFile> {
    if let Some(path) = explicit {
        info!("loading config from {:?}", path);
        return load_and_validate(path);
    }

    let path = default_config_path();
    if path.is_file() {
        info!("loading config from {:?}", path);
        load_and_validate(&path)
    } else {
        debug!("no {:?} found; using built-in defaults", path);
        Ok(ConfigFile::default())
    }
}

/// `Sitebuild.toml` in the current working directory.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("Sitebuild.toml")
}
