//! Logging init: file under the XDG state dir, or stderr fallback.

use anyhow::Result;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Shared append-only log file. `&File` is `Write`, so clones of the `Arc`
/// can be handed out per log line without reopening the file.
struct LogFile(Arc<fs::File>);

impl io::Write for LogFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        (&*self.0).write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        (&*self.0).flush()
    }
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,torq=debug"))
}

/// Initialize structured logging to `~/.local/state/torq/torq.log`.
/// Returns Err if the state dir is unusable so the caller can fall back to
/// `init_stderr`.
pub fn init() -> Result<()> {
    let state_dir = xdg::BaseDirectories::with_prefix("torq")?.get_state_home();
    fs::create_dir_all(&state_dir)?;
    let log_path: PathBuf = state_dir.join("torq.log");

    let file = Arc::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)?,
    );

    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(move || LogFile(Arc::clone(&file)))
        .with_ansi(false)
        .init();

    tracing::info!("torq logging initialized at {}", log_path.display());
    Ok(())
}

/// Stderr-only logging. Use when `init()` fails so the process still runs.
pub fn init_stderr() {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(io::stderr)
        .with_ansi(false)
        .init();
}
