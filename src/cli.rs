// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Command-line arguments for `sitebuild`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "sitebuild",
    version,
    about = "Build a static site, or serve it with live reload while you edit.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `Sitebuild.toml` in the current directory, if present.
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `SITEBUILD_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL", global = true)]
    pub log_level: Option<LogLevel>,

    /// Validate config and print the task tree without running anything.
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Preview server port (dev only). Overrides `[server].port`.
    #[arg(long, value_name = "PORT", global = true)]
    pub port: Option<u16>,

    /// Lifecycle to run. Defaults to `dev`.
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// One-shot production build.
    Build,
    /// Build, serve the output and rebuild on change.
    #[command(alias = "default")]
    Dev,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl CliArgs {
    pub fn command(&self) -> Command {
        self.command.unwrap_or(Command::Dev)
    }
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
