//! `tracing` subscriber setup.
//!
//! `RUST_LOG` always wins; otherwise the level comes from the verbosity flag.
//! The TUI owns the terminal, so it logs to a file instead of stderr.

use std::fs::{OpenOptions, create_dir_all};
use std::path::PathBuf;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

use crate::error::AppError;

/// Where log lines go.
#[derive(Debug, Clone)]
pub enum LogTarget {
    Stderr,
    File(PathBuf),
}

/// Install the global subscriber. Fails if one is already installed.
pub fn init(target: LogTarget, verbose: bool) -> Result<(), AppError> {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let result = match target {
        LogTarget::Stderr => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .try_init(),
        LogTarget::File(path) => {
            if let Some(parent) = path.parent() {
                create_dir_all(parent).map_err(|e| {
                    AppError::output(format!("Failed to create log dir '{}': {e}", parent.display()))
                })?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .map_err(|e| AppError::output(format!("Failed to open log file '{}': {e}", path.display())))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
        }
    };

    result.map_err(|e| AppError::output(format!("Failed to initialize logging: {e}")))
}
