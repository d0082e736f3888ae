use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, fmt};

use crate::error::{Result, ToolError};

/// Handle on the error log set up by [`init`]. Failures logged at `ERROR`
/// level end up in this file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorLog {
    path: PathBuf,
}

impl ErrorLog {
    /// Wraps an already configured log location.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location shown to the user when a run fails.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Installs the process-wide subscriber: a console layer filtered by
/// `RUST_LOG` (or `level`) and an append-only file layer at `ERROR`.
pub fn init(level: &str, error_log: &Path) -> Result<ErrorLog> {
    let path = if error_log.is_absolute() {
        error_log.to_path_buf()
    } else {
        std::env::current_dir()?.join(error_log)
    };

    let file = OpenOptions::new().create(true).append(true).open(&path)?;

    let console_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_filter(console_filter),
        )
        .with(
            fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .with_filter(LevelFilter::ERROR),
        )
        .try_init()
        .map_err(|error| ToolError::Logging(error.to_string()))?;

    tracing::debug!(error_log = %path.display(), "logging initialised");
    Ok(ErrorLog::new(path))
}
