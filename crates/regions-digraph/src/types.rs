// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Core types for region digraph operations.

Module identifiers, the crate error taxonomy and the result alias.
*/

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque module identifier supplied by the module-management system
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModuleId(pub u64);

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for ModuleId {
    fn from(id: u64) -> Self {
        ModuleId(id)
    }
}

/// Result type for region digraph operations
pub type RegionResult<T> = Result<T, RegionError>;

/// Errors that can occur during region digraph operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegionError {
    #[error("Region {0} already exists")]
    DuplicateRegion(String),

    #[error("Graph error: {0}")]
    Graph(#[from] GraphViolation),

    #[error("Digraph modified since copy: copy taken at generation {expected}, digraph is at generation {actual}")]
    ConcurrentModification { expected: u64, actual: u64 },

    #[error("Invalid filter syntax: {0}")]
    InvalidFilterSyntax(String),

    #[error("Region {0} is not present in the digraph")]
    UnknownRegion(String),

    #[error("Invalid region name: {0}")]
    InvalidName(String),

    #[error("Snapshot error: {0}")]
    Snapshot(String),
}

/// Structural invariant violations reported as [`RegionError::Graph`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphViolation {
    #[error("region {0} cannot be connected to itself")]
    SelfLoop(String),

    #[error("region {tail} is already connected to region {head}")]
    DuplicateEdge { tail: String, head: String },

    #[error("region {0} belongs to a different digraph")]
    ForeignRegion(String),

    #[error("module {module} is already assigned to region {region}")]
    ModuleAlreadyAssigned { module: ModuleId, region: String },

    #[error("digraph was not copied from this digraph")]
    NotACopy,
}
