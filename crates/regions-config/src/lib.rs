// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Regions Configuration System
//!
//! Type-safe configuration loader for the region digraph with support for:
//! - TOML file parsing
//! - Environment variable overrides
//! - CLI argument overrides
//!
//! ## Usage
//!
//! ```rust,no_run
//! use regions_config::{load_config, validate_config};
//!
//! let config = load_config(None, None).expect("Failed to load config");
//! validate_config(&config).expect("Invalid config");
//!
//! println!("Strict isolation: {}", config.digraph.strict_isolation);
//! ```

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default configuration file name
pub const CONFIG_FILE_NAME: &str = "regions_configuration.toml";

pub mod loader;
pub mod types;
pub mod validation;

pub use loader::{apply_cli_overrides, apply_environment_overrides, find_config_file, load_config};
pub use types::*;
pub use validation::{validate_config, ConfigValidationError};

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config file not found. Searched: {0}")]
    FileNotFound(String),

    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid TOML syntax: {0}")]
    ParseError(String),

    #[error("Validation failed: {0}")]
    ValidationError(String),
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_conversion() {
        let err: ConfigError = toml::from_str::<RegionsConfig>("[digraph\n")
            .unwrap_err()
            .into();
        assert!(matches!(err, ConfigError::ParseError(_)));
        assert!(err.to_string().starts_with("Invalid TOML syntax"));
    }

    #[test]
    fn test_bad_values_surface_as_validation_errors() {
        let mut config = RegionsConfig::default();
        config.logging.level = "loud".to_string();
        let err = validate_config(&config).unwrap_err();

        // Every variant is produced somewhere in this crate
        let kind = match &err {
            ConfigError::FileNotFound(_) => "file",
            ConfigError::IoError(_) => "io",
            ConfigError::ParseError(_) => "parse",
            ConfigError::ValidationError(_) => "validation",
        };
        assert_eq!(kind, "validation");
    }
}
