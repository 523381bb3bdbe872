// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration validation
//!
//! Checks that values are within range and consistent with each other.

use crate::{ConfigError, ConfigResult, RegionsConfig};

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validation errors that can occur during config validation
#[derive(Debug, Clone)]
pub enum ConfigValidationError {
    MissingRequired { field: String },
    InvalidValue { field: String, reason: String },
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingRequired { field } => {
                write!(f, "Missing required configuration: {}", field)
            }
            Self::InvalidValue { field, reason } => {
                write!(f, "Invalid configuration value for {}: {}", field, reason)
            }
        }
    }
}

/// Validate the complete configuration
///
/// # Errors
///
/// Returns `ConfigError::ValidationError` listing every problem found
pub fn validate_config(config: &RegionsConfig) -> ConfigResult<()> {
    let mut errors = Vec::new();

    validate_digraph(config, &mut errors);
    validate_logging(config, &mut errors);
    validate_persistence(config, &mut errors);

    if !errors.is_empty() {
        let error_messages = errors
            .iter()
            .map(|e| format!("  - {}", e))
            .collect::<Vec<_>>()
            .join("\n");

        return Err(ConfigError::ValidationError(format!(
            "Configuration validation failed:\n{}",
            error_messages
        )));
    }

    Ok(())
}

fn validate_digraph(config: &RegionsConfig, errors: &mut Vec<ConfigValidationError>) {
    let name = &config.digraph.default_region;
    if !name.is_empty() && name.trim() != name {
        errors.push(ConfigValidationError::InvalidValue {
            field: "digraph.default_region".to_string(),
            reason: "must not start or end with whitespace".to_string(),
        });
    }
}

fn validate_logging(config: &RegionsConfig, errors: &mut Vec<ConfigValidationError>) {
    let level = config.logging.level.to_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ConfigValidationError::InvalidValue {
            field: "logging.level".to_string(),
            reason: format!("must be one of {}", LOG_LEVELS.join(", ")),
        });
    }

    if config.logging.file_logging {
        if config.logging.log_dir.trim().is_empty() {
            errors.push(ConfigValidationError::MissingRequired {
                field: "logging.log_dir".to_string(),
            });
        }
        if config.logging.retention_days == 0 {
            errors.push(ConfigValidationError::InvalidValue {
                field: "logging.retention_days".to_string(),
                reason: "must be positive when file logging is enabled".to_string(),
            });
        }
    }
}

fn validate_persistence(config: &RegionsConfig, errors: &mut Vec<ConfigValidationError>) {
    if config.persistence.load_on_startup && config.persistence.snapshot_path.trim().is_empty() {
        errors.push(ConfigValidationError::MissingRequired {
            field: "persistence.snapshot_path".to_string(),
        });
    }
}
