// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration type definitions
//!
//! This module defines all configuration structs that map to sections in
//! `regions_configuration.toml`.

use serde::{Deserialize, Serialize};

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct RegionsConfig {
    pub digraph: DigraphConfig,
    pub logging: LoggingConfig,
    pub persistence: PersistenceConfig,
}

/// Region digraph behaviour
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct DigraphConfig {
    /// Region created with every new digraph; installed modules whose
    /// installer has no region join it. Empty = none.
    pub default_region: String,
    /// Module that sees everything regardless of regions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_module_id: Option<u64>,
    /// Modules outside every region see nothing and are seen by nobody.
    /// Set to `false` to let unassigned modules see and be seen freely.
    pub strict_isolation: bool,
}

impl Default for DigraphConfig {
    fn default() -> Self {
        Self {
            default_region: String::new(),
            system_module_id: None,
            strict_isolation: true,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// trace, debug, info, warn or error
    pub level: String,
    /// Write per-crate JSON log files in addition to the console
    pub file_logging: bool,
    pub log_dir: String,
    /// Days to keep run folders under `log_dir`
    pub retention_days: u64,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file_logging: false,
            log_dir: "logs".to_string(),
            retention_days: 7,
        }
    }
}

/// Snapshot persistence
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct PersistenceConfig {
    pub snapshot_path: String,
    /// Rebuild the digraph from `snapshot_path` at startup when it exists
    pub load_on_startup: bool,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            snapshot_path: "regions_digraph.json".to_string(),
            load_on_startup: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_sections_use_defaults() {
        let config: RegionsConfig = toml::from_str(
            r#"
            [digraph]
            strict_isolation = true
            system_module_id = 0
            "#,
        )
        .unwrap();

        assert!(config.digraph.strict_isolation);
        assert_eq!(config.digraph.system_module_id, Some(0));
        assert_eq!(config.digraph.default_region, "");
        assert_eq!(config.logging, LoggingConfig::default());
        assert_eq!(config.persistence.snapshot_path, "regions_digraph.json");
    }

    #[test]
    fn test_isolation_is_strict_unless_disabled() {
        assert!(DigraphConfig::default().strict_isolation);

        let config: RegionsConfig = toml::from_str("[digraph]\ndefault_region = \"root\"\n").unwrap();
        assert!(config.digraph.strict_isolation);

        let config: RegionsConfig = toml::from_str("[digraph]\nstrict_isolation = false\n").unwrap();
        assert!(!config.digraph.strict_isolation);
    }

    #[test]
    fn test_serialize_round_trip() {
        let mut config = RegionsConfig::default();
        config.digraph.default_region = "root".to_string();
        let text = toml::to_string(&config).unwrap();
        let parsed: RegionsConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed, config);
    }
}
