//! Tracing setup.
//!
//! The server sends events to stdout and to a log file opened for each
//! launch under [`LogConfig::dir`]. Only the newest `keep_files` launch logs
//! survive a restart. The offline tool logs to stderr only.

use std::{
    fs, io,
    path::{Path, PathBuf},
    sync::OnceLock,
};

use directories::ProjectDirs;
use thiserror::Error;
use time::{OffsetDateTime, format_description::BorrowedFormatItem, macros::format_description};
use tracing_appender::{
    non_blocking::WorkerGuard,
    rolling::{InitError, RollingFileAppender, Rotation},
};
use tracing_subscriber::{EnvFilter, Registry, fmt, prelude::*};

use crate::config::LogConfig;

/// Environment variable naming a base directory; logs go to its `logs` child.
pub const HOME_ENV: &str = "EXOCLASS_HOME";
const FILE_PREFIX: &str = "exoclass_";
const FILE_EXTENSION: &str = "log";

static FILE_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

type Timestamp = fmt::time::UtcTime<&'static [BorrowedFormatItem<'static>]>;

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("No log directory configured and no platform data directory found")]
    NoLogDir,
    #[error("Log file operation failed on {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error("Failed to name the log file: {0}")]
    FileName(#[from] time::error::Format),
    #[error("Failed to open the log file: {0}")]
    Appender(#[from] InitError),
    #[error("Failed to install tracing subscriber: {0}")]
    Install(#[from] tracing::subscriber::SetGlobalDefaultError),
}

/// Install server logging. Returns the path of this launch's log file.
pub fn init_server(cfg: &LogConfig) -> Result<PathBuf, LoggingError> {
    let dir = resolve_log_dir(cfg.dir.as_deref())?;
    fs::create_dir_all(&dir).map_err(|source| LoggingError::Io {
        path: dir.clone(),
        source,
    })?;
    let started = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
    let stem = launch_log_stem(started)?;
    let removed = prune_launch_logs(&dir, cfg.keep_files.saturating_sub(1))?;

    let appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(&stem)
        .filename_suffix(FILE_EXTENSION)
        .build(&dir)?;
    let (file_writer, guard) = tracing_appender::non_blocking(appender);

    let subscriber = Registry::default()
        .with(env_filter(&cfg.filter))
        .with(fmt::layer().with_timer(timestamp()).with_writer(io::stdout))
        .with(
            fmt::layer()
                .with_ansi(false)
                .with_timer(timestamp())
                .with_writer(file_writer),
        );
    tracing::subscriber::set_global_default(subscriber)?;
    let _ = FILE_GUARD.set(guard);

    let path = dir.join(format!("{stem}.{FILE_EXTENSION}"));
    tracing::info!("Writing logs to {}", path.display());
    if removed > 0 {
        tracing::debug!("Removed {removed} old launch log(s)");
    }
    Ok(path)
}

/// Install stderr-only logging with `filter` unless `RUST_LOG` is set.
pub fn init_console(filter: &str) -> Result<(), LoggingError> {
    let subscriber = Registry::default().with(env_filter(filter)).with(
        fmt::layer()
            .with_timer(timestamp())
            .with_writer(io::stderr),
    );
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

/// Configured directory, else `$EXOCLASS_HOME/logs`, else the platform data dir.
pub fn resolve_log_dir(configured: Option<&Path>) -> Result<PathBuf, LoggingError> {
    if let Some(dir) = configured {
        return Ok(dir.to_path_buf());
    }
    if let Some(home) = std::env::var_os(HOME_ENV) {
        return Ok(PathBuf::from(home).join("logs"));
    }
    ProjectDirs::from("", "", "exoclass")
        .map(|dirs| dirs.data_local_dir().join("logs"))
        .ok_or(LoggingError::NoLogDir)
}

fn launch_log_stem(started: OffsetDateTime) -> Result<String, LoggingError> {
    const STAMP: &[BorrowedFormatItem<'static>] =
        format_description!("[year][month][day]-[hour][minute][second]");
    Ok(format!("{FILE_PREFIX}{}", started.format(STAMP)?))
}

fn is_launch_log(path: &Path) -> bool {
    path.extension().and_then(|ext| ext.to_str()) == Some(FILE_EXTENSION)
        && path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.starts_with(FILE_PREFIX))
}

/// Delete all but the `keep` newest launch logs. Stamps sort by name.
fn prune_launch_logs(dir: &Path, keep: usize) -> Result<usize, LoggingError> {
    let entries = fs::read_dir(dir).map_err(|source| LoggingError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    let mut launch_logs: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && is_launch_log(path))
        .collect();
    launch_logs.sort();
    let excess = launch_logs.len().saturating_sub(keep);
    for path in &launch_logs[..excess] {
        fs::remove_file(path).map_err(|source| LoggingError::Io {
            path: path.clone(),
            source,
        })?;
    }
    Ok(excess)
}

fn timestamp() -> Timestamp {
    fmt::time::UtcTime::new(format_description!(
        "[year]-[month]-[day]T[hour]:[minute]:[second]Z"
    ))
}

fn env_filter(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}
