// src/config/mod.rs

//! Configuration loading and validation.
//!
//! - `model.rs`: the TOML-backed data model.
//! - `loader.rs`: read a config file from disk, or fall back to defaults.
//! - `validate.rs`: `TryFrom<RawConfigFile> for ConfigFile`.

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_for_cli, load_from_path};
pub use model::{
    ConfigFile, ImagesSection, PathsSection, RawConfigFile, ServerSection, WatchSection,
};
