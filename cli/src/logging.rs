//! Subscriber setup for the `todos` binary.
//!
//! The TUI owns the terminal, so interactive sessions log to `todos.log` in
//! the data directory. One-shot commands log warnings to stderr. `RUST_LOG`
//! overrides either default filter.

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub const LOG_FILE: &str = "todos.log";

fn filter(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

pub fn init_stderr() -> Result<()> {
    tracing_subscriber::registry()
        .with(filter("warn"))
        .with(fmt::layer().with_target(false).without_time().with_writer(std::io::stderr))
        .try_init()
        .context("Failed to install logger")
}

/// Appends to `todos.log` under `data_dir` and returns the file's path.
pub fn init_file(data_dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(data_dir)
        .with_context(|| format!("Failed to create {}", data_dir.display()))?;
    let path = data_dir.join(LOG_FILE);
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("Failed to open {}", path.display()))?;

    tracing_subscriber::registry()
        .with(filter("todos_cli=info"))
        .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
        .try_init()
        .context("Failed to install logger")?;

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "tui session started");
    Ok(path)
}
