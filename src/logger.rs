//! Logging setup for the binary.
//!
//! The library logs through the `log` facade only; the binary decides
//! where records go. By default that is stderr; with a log file the
//! records append there instead, which is what the TUI uses so log
//! output does not fight the terminal.

use std::path::Path;

use anyhow::{Context, Result};

/// Initialise env_logger. `silent` raises the default filter so only
/// warnings and errors get through; `RUST_LOG` still wins.
pub fn init(silent: bool, log_file: Option<&Path>) -> Result<()> {
    let default_filter = if silent { "warn" } else { "info" };
    let env = env_logger::Env::default().default_filter_or(default_filter);
    let mut builder = env_logger::Builder::from_env(env);

    if let Some(path) = log_file {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("could not open log file {}", path.display()))?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }

    builder.try_init().context("logger was already initialised")?;
    Ok(())
}

/// Flush the log and exit when the process is interrupted. Line mode
/// only; the TUI owns the terminal and handles keys itself.
pub fn exit_on_interrupt() {
    tokio::spawn(async {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::info!("caught shutdown, closing log");
            log::logger().flush();
            std::process::exit(1);
        }
    });
}
