// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Logging initialization
//!
//! Console output is always on. With the `file-logging` feature and
//! `file_logging` enabled, each run also writes JSON logs into a timestamped
//! folder:
//! ```text
//! ./logs/
//!   └── run_20250101_120000/
//!       ├── regions-digraph.log
//!       ├── regions-config.log
//!       └── regions.log (combined)
//! ```

use anyhow::{Context, Result};
use chrono::{NaiveDateTime, TimeZone, Utc};
use std::path::{Path, PathBuf};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

use crate::cli::CrateDebugFlags;
use crate::config::LoggingOptions;

const RUN_PREFIX: &str = "run_";
const RUN_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Keeps file writers alive; logs are flushed when dropped
pub struct LoggingGuard {
    #[cfg(feature = "file-logging")]
    _file_guards: Vec<tracing_appender::non_blocking::WorkerGuard>,
    log_dir: Option<PathBuf>,
}

impl LoggingGuard {
    /// Run folder, if file logging is active
    pub fn log_dir(&self) -> Option<&Path> {
        self.log_dir.as_deref()
    }
}

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Install the global subscriber
///
/// # Errors
///
/// Fails if the log folder cannot be created or a global subscriber is
/// already installed.
pub fn init_logging(debug_flags: &CrateDebugFlags, options: &LoggingOptions) -> Result<LoggingGuard> {
    let filter = debug_flags.to_filter_string(&options.level);

    let mut layers: Vec<BoxedLayer> = Vec::new();
    let console_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_filter(EnvFilter::new(&filter));
    layers.push(console_layer.boxed());

    #[cfg(feature = "file-logging")]
    let (file_guards, log_dir) = if options.file_logging {
        let (file_layers, guards, run_folder) = file_layers(&filter, options)?;
        layers.extend(file_layers);
        (guards, Some(run_folder))
    } else {
        (Vec::new(), None)
    };
    #[cfg(not(feature = "file-logging"))]
    let log_dir: Option<PathBuf> = None;

    Registry::default()
        .with(layers)
        .try_init()
        .context("Failed to install the global tracing subscriber")?;

    #[cfg(not(feature = "file-logging"))]
    if options.file_logging {
        tracing::warn!(
            target: "regions-observability",
            "File logging requested but this build lacks the file-logging feature; logging to console only"
        );
    }

    Ok(LoggingGuard {
        #[cfg(feature = "file-logging")]
        _file_guards: file_guards,
        log_dir,
    })
}

#[cfg(feature = "file-logging")]
fn file_layers(
    filter: &str,
    options: &LoggingOptions,
) -> Result<(
    Vec<BoxedLayer>,
    Vec<tracing_appender::non_blocking::WorkerGuard>,
    PathBuf,
)> {
    use tracing_appender::rolling;

    let run_folder = options.log_dir.join(format!(
        "{}{}",
        RUN_PREFIX,
        Utc::now().format(RUN_TIMESTAMP_FORMAT)
    ));
    std::fs::create_dir_all(&run_folder)
        .with_context(|| format!("Failed to create log directory: {}", run_folder.display()))?;

    cleanup_old_logs(&options.log_dir, options.retention_days, options.retention_runs)?;

    let mut layers: Vec<BoxedLayer> = Vec::new();
    let mut guards = Vec::new();

    for crate_name in crate::KNOWN_CRATES {
        let appender = rolling::never(&run_folder, format!("{}.log", crate_name));
        let (writer, guard) = tracing_appender::non_blocking(appender);
        guards.push(guard);
        layers.push(
            tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .json()
                .with_filter(EnvFilter::new(format!("off,{}=debug", crate_name)))
                .boxed(),
        );
    }

    let combined = rolling::never(&run_folder, "regions.log");
    let (writer, guard) = tracing_appender::non_blocking(combined);
    guards.push(guard);
    layers.push(
        tracing_subscriber::fmt::layer()
            .with_writer(writer)
            .with_target(true)
            .json()
            .with_filter(EnvFilter::new(filter))
            .boxed(),
    );

    Ok((layers, guards, run_folder))
}

/// Delete run folders older than `retention_days`, then all but the newest
/// `retention_runs`
///
/// Returns the number of folders removed. Folders whose names do not parse as
/// run folders are left alone.
pub fn cleanup_old_logs(base_log_dir: &Path, retention_days: u64, retention_runs: usize) -> Result<usize> {
    if !base_log_dir.exists() {
        return Ok(0);
    }

    // None when the age limit reaches past the representable range
    let cutoff = i64::try_from(retention_days)
        .ok()
        .and_then(chrono::Duration::try_days)
        .and_then(|age| Utc::now().checked_sub_signed(age));
    let mut runs = Vec::new();
    for entry in std::fs::read_dir(base_log_dir)
        .with_context(|| format!("Failed to read log directory: {}", base_log_dir.display()))?
    {
        let path = entry?.path();
        if !path.is_dir() {
            continue;
        }
        let started = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(|n| n.strip_prefix(RUN_PREFIX))
            .and_then(|ts| NaiveDateTime::parse_from_str(ts, RUN_TIMESTAMP_FORMAT).ok())
            .map(|naive| Utc.from_utc_datetime(&naive));
        if let Some(started) = started {
            runs.push((path, started));
        }
    }

    // Newest first
    runs.sort_by(|a, b| b.1.cmp(&a.1));

    let mut removed = 0;
    for (index, (path, started)) in runs.iter().enumerate() {
        let expired = cutoff.map_or(false, |cutoff| *started < cutoff);
        if expired || index >= retention_runs {
            match std::fs::remove_dir_all(path) {
                Ok(()) => removed += 1,
                Err(e) => eprintln!(
                    "Warning: Failed to remove old log directory {}: {}",
                    path.display(),
                    e
                ),
            }
        }
    }
    Ok(removed)
}

/// Initialize console logging with default options
pub fn init_logging_default(debug_flags: &CrateDebugFlags) -> Result<LoggingGuard> {
    init_logging(debug_flags, &LoggingOptions::default())
}
