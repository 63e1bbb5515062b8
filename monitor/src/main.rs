use std::{io, path::PathBuf};

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};

mod app;
mod config;
mod input;
mod logging;
mod state;
mod ui;

/// Live console for the solver's shared memory region.
#[derive(Parser, Debug)]
#[command(name = "shm-monitor", version)]
struct Cli {
    /// JSON config file; overrides SHM_MONITOR_CONFIG.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Region name; overrides the config and SHM_NAME.
    #[arg(long)]
    name: Option<String>,

    #[command(subcommand)]
    command: Option<Mode>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// Interactive console (default).
    Watch,
    /// Print sizes and offsets of the region layout.
    Layout,
    /// Print one read of the region as JSON.
    Snapshot,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut cfg = config::load(cli.config.as_deref())?;
    config::apply_overrides(&mut cfg, |key| std::env::var(key).ok());
    if let Some(name) = cli.name {
        cfg.shm_name = name;
    }
    let settings = config::build(&cfg).map_err(|e| anyhow!("invalid config: {e}"))?;

    match cli.command.unwrap_or(Mode::Watch) {
        Mode::Watch => {
            logging::init_file(&cfg.log_path())?;
            app::run::run(&settings)
        }
        Mode::Layout => app::report::print_layout(&mut io::stdout().lock()),
        Mode::Snapshot => {
            logging::init_stderr();
            app::report::print_snapshot(&settings, &mut io::stdout().lock())
        }
    }
}
