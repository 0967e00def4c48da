//! Logging setup (A3).
//!
//! Initializes a `tracing-subscriber` pipeline once, at process startup,
//! before the orchestrator runs. The sink is a plain append-mode file —
//! matching the append-only discipline the engine's own output files
//! follow — with level filtering from configuration.

use crate::config::LogLevel;
use std::fs::OpenOptions;
use std::path::Path;
use tracing_subscriber::EnvFilter;

pub fn init(log_file: &Path, level: LogLevel) -> std::io::Result<()> {
    if let Some(parent) = log_file.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let file = OpenOptions::new().create(true).append(true).open(log_file)?;

    let filter = EnvFilter::try_new(level.as_str()).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(file)
        .with_ansi(false)
        .init();

    Ok(())
}
