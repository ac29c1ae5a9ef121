// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Unified logging initialization
//!
//! Console output is always enabled. With the `file-logging` feature and a log
//! directory, a JSON log file is also written into a timestamped run folder.

use anyhow::{Context, Result};
use chrono::{NaiveDateTime, Utc};
use std::path::{Path, PathBuf};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

use crate::cli::CrateDebugFlags;

/// Logging settings, usually taken from the `[logging]` config section
#[derive(Debug, Clone)]
pub struct LoggingOptions {
    /// Default level for targets without a debug flag
    pub level: String,
    /// Base directory for run folders; `None` disables file logging
    pub log_dir: Option<PathBuf>,
    /// Keep logs for N days (default: 30)
    pub retention_days: Option<u64>,
    /// Keep N most recent runs (default: 10)
    pub retention_runs: Option<usize>,
}

impl Default for LoggingOptions {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_dir: None,
            retention_days: None,
            retention_runs: None,
        }
    }
}

/// Keeps file writers alive; logs are flushed when dropped
pub struct LoggingGuard {
    #[cfg(feature = "file-logging")]
    _file_guards: Vec<tracing_appender::non_blocking::WorkerGuard>,
    log_dir: Option<PathBuf>,
}

impl LoggingGuard {
    /// Run folder receiving the JSON log, if file logging is active
    pub fn log_dir(&self) -> Option<&Path> {
        self.log_dir.as_deref()
    }
}

/// Initialize logging with console output and optional file output
///
/// Creates a timestamped folder structure when a log directory is given:
/// ```text
/// ./logs/
///   └── run_20250101_120000/
///       └── connectometry.log
/// ```
pub fn init_logging(debug_flags: &CrateDebugFlags, options: &LoggingOptions) -> Result<LoggingGuard> {
    let filter = debug_flags.to_filter_string(&options.level);
    let env_filter = EnvFilter::try_new(&filter)
        .with_context(|| format!("Invalid log filter: {}", filter))?;

    let mut layers = Vec::new();

    let console_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_file(false)
        .with_line_number(false)
        .with_filter(env_filter.clone());
    layers.push(console_layer.boxed());

    #[cfg(feature = "file-logging")]
    let mut file_guards = Vec::new();
    let mut run_folder = None;

    if let Some(base_log_dir) = &options.log_dir {
        #[cfg(feature = "file-logging")]
        {
            let timestamp = Utc::now().format("%Y%m%d_%H%M%S");
            let folder = base_log_dir.join(format!("run_{}", timestamp));
            std::fs::create_dir_all(&folder)
                .with_context(|| format!("Failed to create log directory: {}", folder.display()))?;

            cleanup_old_logs(base_log_dir, options.retention_days, options.retention_runs)?;

            let appender = tracing_appender::rolling::never(&folder, "connectometry.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);
            file_guards.push(guard);

            let file_layer = tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .json()
                .with_filter(env_filter)
                .boxed();
            layers.push(file_layer);
            run_folder = Some(folder);
        }
        #[cfg(not(feature = "file-logging"))]
        {
            eprintln!(
                "Warning: file logging to {} requested but the `file-logging` feature is disabled",
                base_log_dir.display()
            );
        }
    }

    Registry::default()
        .with(layers)
        .try_init()
        .context("Failed to install the global tracing subscriber")?;

    Ok(LoggingGuard {
        #[cfg(feature = "file-logging")]
        _file_guards: file_guards,
        log_dir: run_folder,
    })
}

/// Clean up old log directories based on retention policy
pub(crate) fn cleanup_old_logs(
    base_log_dir: &Path,
    retention_days: Option<u64>,
    retention_runs: Option<usize>,
) -> Result<()> {
    if !base_log_dir.exists() {
        return Ok(());
    }

    let retention_days = retention_days.unwrap_or(30);
    let retention_runs = retention_runs.unwrap_or(10);
    let cutoff_date = Utc::now() - chrono::Duration::days(retention_days as i64);

    let mut runs = Vec::new();
    for entry in std::fs::read_dir(base_log_dir)? {
        let path = entry?.path();
        if !path.is_dir() {
            continue;
        }
        let Some(timestamp_str) = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(|n| n.strip_prefix("run_"))
        else {
            continue;
        };
        if let Ok(dt) = NaiveDateTime::parse_from_str(timestamp_str, "%Y%m%d_%H%M%S") {
            runs.push((path, dt.and_utc()));
        }
    }

    // Oldest first
    runs.sort_by_key(|(_, dt)| *dt);

    let (expired, kept): (Vec<_>, Vec<_>) = runs.into_iter().partition(|(_, dt)| *dt < cutoff_date);
    let excess = kept.len().saturating_sub(retention_runs);

    for (path, _) in expired.iter().chain(kept.iter().take(excess)) {
        if let Err(e) = std::fs::remove_dir_all(path) {
            eprintln!("Warning: Failed to remove old log directory {}: {}", path.display(), e);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn run_dir(base: &Path, days_ago: i64) -> PathBuf {
        let stamp = (Utc::now() - chrono::Duration::days(days_ago)).format("%Y%m%d_%H%M%S");
        let dir = base.join(format!("run_{}", stamp));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_expired_runs_are_removed() {
        let base = tempdir().unwrap();
        let old = run_dir(base.path(), 45);
        let recent = run_dir(base.path(), 1);

        cleanup_old_logs(base.path(), Some(30), Some(10)).unwrap();

        assert!(!old.exists());
        assert!(recent.exists());
    }

    #[test]
    fn test_only_most_recent_runs_are_kept() {
        let base = tempdir().unwrap();
        let oldest = run_dir(base.path(), 3);
        let middle = run_dir(base.path(), 2);
        let newest = run_dir(base.path(), 1);

        cleanup_old_logs(base.path(), Some(30), Some(2)).unwrap();

        assert!(!oldest.exists());
        assert!(middle.exists());
        assert!(newest.exists());
    }

    #[test]
    fn test_unrelated_directories_are_ignored() {
        let base = tempdir().unwrap();
        let other = base.path().join("not_a_run");
        std::fs::create_dir_all(&other).unwrap();

        cleanup_old_logs(base.path(), Some(0), Some(0)).unwrap();

        assert!(other.exists());
    }
}
