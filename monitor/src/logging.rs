use std::{fs::OpenOptions, path::Path};

use anyhow::{Context, Result};
use env_logger::{Env, Target};

/// Logs to `path`, appending. The terminal belongs to the TUI.
///
/// # Errors
/// Returns an error if the log file cannot be opened.
pub fn init_file(path: &Path) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("cannot open log file '{}'", path.display()))?;

    let mut builder = env_logger::Builder::from_env(Env::default().default_filter_or("info"));
    builder
        .format_timestamp_millis()
        .target(Target::Pipe(Box::new(file)));
    let _ = builder.try_init();
    Ok(())
}

/// Logs warnings and above to stderr, for the one-shot subcommands.
pub fn init_stderr() {
    let mut builder = env_logger::Builder::from_env(Env::default().default_filter_or("warn"));
    builder.format_timestamp_millis().target(Target::Stderr);
    let _ = builder.try_init();
}
