//! File logging. The TUI owns the terminal, so log output goes to
//! `$XDG_STATE_HOME/prdeck/prdeck.log` and never to stdout or stderr.

use std::fs::{self, OpenOptions};
use std::io;
use std::path::PathBuf;

use tracing_subscriber::EnvFilter;

use crate::config::xdg_dir;

const LOG_FILTER_ENV: &str = "PRDECK_LOG";

pub fn log_path() -> PathBuf {
    xdg_dir("XDG_STATE_HOME", ".local/state")
        .join("prdeck")
        .join("prdeck.log")
}

/// Installs the global subscriber. Filter comes from `PRDECK_LOG`, defaulting to `info`.
pub fn init() -> io::Result<PathBuf> {
    let path = log_path();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let log_file = OpenOptions::new().create(true).append(true).open(&path)?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_env(LOG_FILTER_ENV).unwrap_or_else(|_| "info".into()))
        .with_ansi(false)
        .with_writer(std::sync::Mutex::new(log_file))
        .init();
    Ok(path)
}
