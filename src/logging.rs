//! Log subscriber setup.
//!
//! The terminal owns stdout while an app runs, so logs go to a file by
//! default. `TERMWEAVE_LOG` names the file and `TERMWEAVE_LOG_LEVEL` holds an
//! `EnvFilter` directive (default `info`).

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

use crate::error::AppError;

pub const LOG_FILE_ENV: &str = "TERMWEAVE_LOG";
pub const LOG_LEVEL_ENV: &str = "TERMWEAVE_LOG_LEVEL";
const DEFAULT_FILE: &str = "termweave.log";
const DEFAULT_LEVEL: &str = "info";

/// Where log lines are written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    /// Append to a file.
    File(PathBuf),
    /// Write to stderr. Only useful when no terminal UI is running.
    Stderr,
    /// No subscriber.
    Off,
}

impl LogTarget {
    /// The file named by `TERMWEAVE_LOG`, or `termweave.log`.
    pub fn from_env() -> Self {
        let path = std::env::var_os(LOG_FILE_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_FILE));
        LogTarget::File(path)
    }
}

impl Default for LogTarget {
    fn default() -> Self {
        Self::from_env()
    }
}

/// Filter directive from `TERMWEAVE_LOG_LEVEL`, or `info`.
pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_LEVEL_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LEVEL))
}

/// Install the global subscriber. Returns `Ok(false)` when one is already
/// installed.
pub fn init(target: LogTarget) -> Result<bool, AppError> {
    let builder = tracing_subscriber::fmt().with_env_filter(env_filter()).with_target(true);
    let installed = match target {
        LogTarget::Off => return Ok(false),
        LogTarget::Stderr => builder.with_writer(std::io::stderr).try_init(),
        LogTarget::File(path) => {
            let file = OpenOptions::new().create(true).append(true).open(&path)?;
            builder.with_ansi(false).with_writer(Mutex::new(file)).try_init()
        }
    };
    match installed {
        Ok(()) => Ok(true),
        Err(err) if tracing::dispatcher::has_been_set() => {
            tracing::debug!(error = %err, "log subscriber already installed");
            Ok(false)
        }
        Err(err) => Err(AppError::Logging(err.to_string())),
    }
}
