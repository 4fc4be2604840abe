//! Log output setup.
//!
//! Logs go to a file when one is configured, otherwise to stderr. A log file
//! that cannot be opened is not fatal: output falls back to stderr and the
//! failure is recorded as the first log line.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;
use std::sync::Mutex;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tracing::Level;
use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::EnvFilter;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    #[value(alias = "warning")]
    #[serde(alias = "warning")]
    Warn,
    #[value(alias = "err")]
    #[serde(alias = "err")]
    Error,
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    }
}

fn filter(level: LogLevel) -> EnvFilter {
    EnvFilter::from_default_env().add_directive(Level::from(level).into())
}

fn timer() -> ChronoLocal {
    ChronoLocal::new(TIME_FORMAT.to_string())
}

/// Where log records are written.
#[derive(Debug)]
pub(crate) enum LogTarget {
    File(File),
    /// Console output, carrying the error that kept the log file from opening.
    Stderr(Option<io::Error>),
}

/// Open `log_file` for appending, or pick stderr when there is none or it
/// cannot be opened.
pub(crate) fn open_target(log_file: Option<&Path>) -> LogTarget {
    let Some(path) = log_file else {
        return LogTarget::Stderr(None);
    };
    match OpenOptions::new().create(true).append(true).open(path) {
        Ok(file) => LogTarget::File(file),
        Err(e) => LogTarget::Stderr(Some(e)),
    }
}

/// Install the global subscriber. Call once, before anything logs.
pub fn init(level: LogLevel, log_file: Option<&Path>) {
    match open_target(log_file) {
        LogTarget::File(file) => {
            if let Some(path) = log_file {
                eprintln!("Logging to {}", path.display());
            }
            tracing_subscriber::fmt()
                .with_env_filter(filter(level))
                .with_timer(timer())
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        LogTarget::Stderr(None) => init_stderr(level),
        LogTarget::Stderr(Some(e)) => {
            init_stderr(level);
            let path = log_file.unwrap_or_else(|| Path::new(""));
            tracing::error!(
                path = %path.display(),
                error = %e,
                "Cannot open log file, logging to stderr instead"
            );
        }
    }
}

fn init_stderr(level: LogLevel) {
    tracing_subscriber::fmt()
        .with_env_filter(filter(level))
        .with_timer(timer())
        .with_writer(std::io::stderr)
        .init();
}
