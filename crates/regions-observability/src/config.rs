// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Logging options

use std::path::PathBuf;

use regions_config::LoggingConfig;

/// Resolved logging settings passed to [`crate::init_logging`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingOptions {
    /// Base level for targets without a debug flag
    pub level: String,
    pub file_logging: bool,
    pub log_dir: PathBuf,
    /// Run folders older than this are deleted
    pub retention_days: u64,
    /// At most this many run folders are kept
    pub retention_runs: usize,
}

impl Default for LoggingOptions {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file_logging: false,
            log_dir: PathBuf::from("./logs"),
            retention_days: 7,
            retention_runs: 10,
        }
    }
}

impl From<&LoggingConfig> for LoggingOptions {
    fn from(config: &LoggingConfig) -> Self {
        Self {
            level: config.level.to_lowercase(),
            file_logging: config.file_logging,
            log_dir: PathBuf::from(&config.log_dir),
            retention_days: config.retention_days,
            ..Self::default()
        }
    }
}
