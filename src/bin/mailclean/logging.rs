use std::fs::OpenOptions;
use std::io;
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing::Level;

pub const DEBUG_LOG: &str = "debug.log";

/// Warnings to stderr, or everything from DEBUG up to `debug.log`.
pub fn init(debug: bool) -> Result<()> {
    if debug {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(DEBUG_LOG)
            .with_context(|| format!("open {DEBUG_LOG}"))?;
        tracing_subscriber::fmt()
            .with_max_level(Level::DEBUG)
            .with_ansi(false)
            .with_target(false)
            .with_writer(Mutex::new(file))
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_max_level(Level::WARN)
            .with_target(false)
            .with_writer(io::stderr)
            .init();
    }
    Ok(())
}
