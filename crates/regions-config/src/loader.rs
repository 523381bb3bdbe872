// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration file loading with override support
//!
//! Three tiers, later tiers win:
//! 1. TOML file (base defaults)
//! 2. Environment variables (runtime overrides)
//! 3. CLI arguments (explicit user overrides)

use crate::{ConfigError, ConfigResult, RegionsConfig, CONFIG_FILE_NAME};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Find the configuration file
///
/// Search order:
/// 1. `REGIONS_CONFIG_PATH` environment variable
/// 2. Current working directory: `./regions_configuration.toml`
/// 3. Up to 5 parent directories
///
/// # Errors
///
/// Returns `ConfigError::FileNotFound` if no config file is found in any location
pub fn find_config_file() -> ConfigResult<PathBuf> {
    if let Ok(env_path) = env::var("REGIONS_CONFIG_PATH") {
        let path = PathBuf::from(env_path);
        if path.exists() {
            return Ok(path);
        }
        return Err(ConfigError::FileNotFound(format!(
            "Config file specified by REGIONS_CONFIG_PATH not found: {}",
            path.display()
        )));
    }

    let mut search_paths = Vec::new();
    if let Ok(cwd) = env::current_dir() {
        search_paths.push(cwd.join(CONFIG_FILE_NAME));

        let mut current = cwd;
        for _ in 0..5 {
            match current.parent() {
                Some(parent) => {
                    search_paths.push(parent.join(CONFIG_FILE_NAME));
                    current = parent.to_path_buf();
                }
                None => break,
            }
        }
    }

    if let Some(path) = search_paths.iter().find(|p| p.exists()) {
        return Ok(path.clone());
    }

    let search_list = search_paths
        .iter()
        .map(|p| format!("  - {}", p.display()))
        .collect::<Vec<_>>()
        .join("\n");

    Err(ConfigError::FileNotFound(format!(
        "Configuration file '{}' not found in any of these locations:\n{}\n\nSet REGIONS_CONFIG_PATH environment variable to specify custom location.",
        CONFIG_FILE_NAME, search_list
    )))
}

/// Load configuration from TOML file
///
/// # Arguments
///
/// * `config_path` - Optional path to config file. If `None`, will search for config file.
/// * `cli_args` - Optional CLI argument overrides
///
/// # Errors
///
/// Returns error if config file is not found or contains invalid TOML
pub fn load_config(
    config_path: Option<&Path>,
    cli_args: Option<&HashMap<String, String>>,
) -> ConfigResult<RegionsConfig> {
    let config_file = match config_path {
        Some(path) => path.to_path_buf(),
        None => find_config_file()?,
    };

    let content = fs::read_to_string(&config_file)?;
    let mut config: RegionsConfig = toml::from_str(&content)?;

    apply_environment_overrides(&mut config);
    if let Some(cli) = cli_args {
        apply_cli_overrides(&mut config, cli);
    }

    Ok(config)
}

fn parse_bool(value: &str) -> bool {
    let value = value.to_lowercase();
    value == "true" || value == "1" || value == "yes"
}

/// Apply environment variable overrides to configuration
///
/// Supported environment variables:
/// - `REGIONS_DEFAULT_REGION` -> `digraph.default_region`
/// - `REGIONS_SYSTEM_MODULE_ID` -> `digraph.system_module_id`
/// - `REGIONS_STRICT_ISOLATION` -> `digraph.strict_isolation`
/// - `REGIONS_LOG_LEVEL` -> `logging.level`
/// - `REGIONS_FILE_LOGGING` -> `logging.file_logging`
/// - `REGIONS_LOG_DIR` -> `logging.log_dir`
/// - `REGIONS_SNAPSHOT_PATH` -> `persistence.snapshot_path`
pub fn apply_environment_overrides(config: &mut RegionsConfig) {
    if let Ok(value) = env::var("REGIONS_DEFAULT_REGION") {
        config.digraph.default_region = value;
    }
    if let Ok(value) = env::var("REGIONS_SYSTEM_MODULE_ID") {
        if let Ok(id) = value.parse::<u64>() {
            config.digraph.system_module_id = Some(id);
        }
    }
    if let Ok(value) = env::var("REGIONS_STRICT_ISOLATION") {
        config.digraph.strict_isolation = parse_bool(&value);
    }

    if let Ok(value) = env::var("REGIONS_LOG_LEVEL") {
        config.logging.level = value;
    }
    if let Ok(value) = env::var("REGIONS_FILE_LOGGING") {
        config.logging.file_logging = parse_bool(&value);
    }
    if let Ok(value) = env::var("REGIONS_LOG_DIR") {
        config.logging.log_dir = value;
    }

    if let Ok(value) = env::var("REGIONS_SNAPSHOT_PATH") {
        config.persistence.snapshot_path = value;
    }
}

/// Apply CLI argument overrides to configuration
///
/// # Arguments
///
/// * `config` - Configuration to modify
/// * `cli_args` - CLI arguments (e.g., `{"strict_isolation": "true", "log_level": "debug"}`)
pub fn apply_cli_overrides(config: &mut RegionsConfig, cli_args: &HashMap<String, String>) {
    if let Some(value) = cli_args.get("default_region") {
        config.digraph.default_region = value.clone();
    }
    if let Some(value) = cli_args.get("system_module_id") {
        if let Ok(id) = value.parse::<u64>() {
            config.digraph.system_module_id = Some(id);
        }
    }
    if let Some(value) = cli_args.get("strict_isolation") {
        config.digraph.strict_isolation = parse_bool(value);
    }

    if let Some(value) = cli_args.get("log_level") {
        config.logging.level = value.clone();
    }
    if let Some(value) = cli_args.get("file_logging") {
        config.logging.file_logging = parse_bool(value);
    }
    if let Some(value) = cli_args.get("log_dir") {
        config.logging.log_dir = value.clone();
    }

    if let Some(value) = cli_args.get("snapshot_path") {
        config.persistence.snapshot_path = value.clone();
    }
}
