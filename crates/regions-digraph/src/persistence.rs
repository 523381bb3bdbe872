// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Digraph persistence (save/load)
//!
//! A [`DigraphSnapshot`] is the serializable form of a digraph: regions with
//! their module ids, edges with their sharing policies and the default region.
//! Snapshots are written as JSON through `serde_json`. Durable storage beyond a
//! single file is left to the embedding runtime.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;

use regions_config::{DigraphConfig, RegionsConfig};

use crate::digraph::{DigraphState, RegionDigraph};
use crate::filter::RegionFilter;
use crate::types::{ModuleId, RegionError, RegionResult};

/// Snapshot format understood by this crate
pub const SNAPSHOT_FORMAT_VERSION: u32 = 1;

/// Serializable digraph state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DigraphSnapshot {
    pub format_version: u32,
    /// Sorted by name
    pub regions: Vec<RegionRecord>,
    /// Sorted by (tail, head)
    pub edges: Vec<EdgeRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_region: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionRecord {
    pub name: String,
    /// Sorted ascending
    #[serde(default)]
    pub modules: Vec<ModuleId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeRecord {
    pub tail: String,
    pub head: String,
    /// Filter clauses per namespace (empty for an unconstrained filter)
    #[serde(default)]
    pub filter: BTreeMap<String, Vec<String>>,
}

impl DigraphSnapshot {
    /// Serialize to pretty-printed JSON
    pub fn to_json(&self) -> RegionResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| RegionError::Snapshot(format!("Serialize failed: {}", e)))
    }

    pub fn from_json(json: &str) -> RegionResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| RegionError::Snapshot(format!("Deserialize failed: {}", e)))
    }

    /// Save snapshot to file
    pub fn save_to_file(&self, path: &Path) -> RegionResult<()> {
        let encoded = self.to_json()?;
        std::fs::write(path, encoded)
            .map_err(|e| RegionError::Snapshot(format!("Write failed: {}", e)))?;
        Ok(())
    }

    /// Load snapshot from file
    pub fn load_from_file(path: &Path) -> RegionResult<Self> {
        let data = std::fs::read_to_string(path)
            .map_err(|e| RegionError::Snapshot(format!("Read failed: {}", e)))?;
        Self::from_json(&data)
    }
}

impl RegionDigraph {
    /// Serializable form of the current state
    pub fn snapshot(&self) -> DigraphSnapshot {
        let published = self.load();
        let state = &published.state;
        let names = state.region_names();

        let regions = names
            .iter()
            .map(|name| RegionRecord {
                name: name.to_string(),
                modules: state
                    .modules_of(name)
                    .map(|modules| modules.iter().copied().collect())
                    .unwrap_or_default(),
            })
            .collect();

        let edges = names
            .iter()
            .flat_map(|tail| {
                state.edges_from(tail).map(move |(head, filter)| EdgeRecord {
                    tail: tail.to_string(),
                    head: head.to_string(),
                    filter: filter.sharing_policy(),
                })
            })
            .collect();

        DigraphSnapshot {
            format_version: SNAPSHOT_FORMAT_VERSION,
            regions,
            edges,
            default_region: state.default_region().map(|name| name.to_string()),
        }
    }

    /// Build a new digraph from a snapshot
    ///
    /// # Errors
    ///
    /// - [`RegionError::Snapshot`] for an unsupported format version
    /// - any structural error the recorded regions, edges or modules violate
    pub fn from_snapshot(snapshot: &DigraphSnapshot, config: DigraphConfig) -> RegionResult<Self> {
        if snapshot.format_version != SNAPSHOT_FORMAT_VERSION {
            return Err(RegionError::Snapshot(format!(
                "Unsupported snapshot format version {} (expected {})",
                snapshot.format_version, SNAPSHOT_FORMAT_VERSION
            )));
        }

        let mut state = DigraphState::default();
        for record in &snapshot.regions {
            state.add_region(&record.name)?;
            for module in &record.modules {
                state.add_module(&record.name, *module)?;
            }
        }
        for edge in &snapshot.edges {
            let filter = RegionFilter::from_sharing_policy(&edge.filter)?;
            state.add_edge(&edge.tail, filter, &edge.head)?;
        }
        state.set_default_region(snapshot.default_region.as_deref())?;

        info!(
            target: "regions-digraph",
            "Loaded digraph snapshot: {} regions, {} edges",
            snapshot.regions.len(),
            snapshot.edges.len()
        );
        Ok(RegionDigraph::from_state(config, state))
    }

    /// Startup constructor
    ///
    /// With `persistence.load_on_startup` set and a file at
    /// `persistence.snapshot_path`, the digraph is rebuilt from it. Otherwise a
    /// fresh digraph is created from `config.digraph`.
    ///
    /// # Errors
    ///
    /// Fails if the snapshot file exists but cannot be read or rebuilt
    pub fn from_config(config: &RegionsConfig) -> RegionResult<Self> {
        let path = Path::new(&config.persistence.snapshot_path);
        if config.persistence.load_on_startup && path.is_file() {
            info!(target: "regions-digraph", "Restoring digraph from {}", path.display());
            let snapshot = DigraphSnapshot::load_from_file(path)?;
            return Self::from_snapshot(&snapshot, config.digraph.clone());
        }
        Ok(Self::new(config.digraph.clone()))
    }
}
