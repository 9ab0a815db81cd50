// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod lifecycle;
pub mod logging;
pub mod server;
pub mod task;
pub mod transform;
pub mod watch;

use anyhow::Result;
use tracing::{debug, info};

use crate::cli::{CliArgs, Command};
use crate::config::load_for_cli;
use crate::lifecycle::Mode;

/// High-level entry point used by `main.rs`.
///
/// Loads the config, applies CLI overrides, then runs either the release
/// build or the dev lifecycle (build, serve, watch until Ctrl-C).
pub async fn run(args: CliArgs) -> Result<()> {
    let mut cfg = load_for_cli(args.config.as_deref())?;
    if let Some(port) = args.port {
        cfg = cfg.with_port(port);
    }

    let mode = match args.command() {
        Command::Build => Mode::Release,
        Command::Dev => Mode::Dev,
    };

    if args.dry_run {
        println!("sitebuild dry-run ({mode:?})");
        print!("{}", lifecycle::describe(&cfg, mode)?);
        debug!("dry-run complete (no execution)");
        return Ok(());
    }

    info!(?mode, source = %cfg.source_dir().display(), output = %cfg.output_dir().display(), "starting");
    match mode {
        Mode::Release => lifecycle::run_release(&cfg).await?,
        Mode::Dev => lifecycle::run_dev(&cfg).await?,
    }
    Ok(())
}
