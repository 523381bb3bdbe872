// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Region handles.

A [`Region`] is a named isolation domain. The handle itself holds no state:
membership and edges live in the owning digraph, reached through a non-owning
back reference. Once the digraph is dropped every mutating call on the handle
fails with [`RegionError::UnknownRegion`] and queries return empty results.

## Example
```rust,ignore
let core = digraph.create_region("core")?;
let apps = digraph.create_region("apps")?;
apps.add_module(ModuleId(42))?;
apps.connect_region(&core, filter)?;
```
*/

use std::collections::BTreeSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Weak};

use crate::digraph::{DigraphInner, RegionDigraph};
use crate::filter::RegionFilter;
use crate::types::{ModuleId, RegionError, RegionResult};

/// Handle to a region of a [`RegionDigraph`]
///
/// Equality and hashing use the owning digraph's identity and the region
/// name, so handles from a copy never compare equal to the original's.
#[derive(Clone)]
pub struct Region {
    name: Arc<str>,
    digraph_id: u64,
    digraph: Weak<DigraphInner>,
}

impl Region {
    pub(crate) fn new(name: Arc<str>, digraph_id: u64, digraph: Weak<DigraphInner>) -> Self {
        Self {
            name,
            digraph_id,
            digraph,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn digraph_id(&self) -> u64 {
        self.digraph_id
    }

    /// The owning digraph, if it is still alive
    pub fn digraph(&self) -> Option<RegionDigraph> {
        self.digraph.upgrade().map(RegionDigraph::from_inner)
    }

    fn require_digraph(&self) -> RegionResult<RegionDigraph> {
        self.digraph()
            .ok_or_else(|| RegionError::UnknownRegion(self.name.to_string()))
    }

    /// Assign a module to this region
    ///
    /// # Errors
    ///
    /// See [`RegionDigraph::add_module`]
    pub fn add_module(&self, module: ModuleId) -> RegionResult<()> {
        self.require_digraph()?.add_module(self, module)
    }

    /// Remove a module from this region; `false` if it was not a member
    pub fn remove_module(&self, module: ModuleId) -> RegionResult<bool> {
        self.require_digraph()?.remove_module(self, module)
    }

    pub fn contains(&self, module: ModuleId) -> bool {
        self.digraph()
            .map(|d| d.region_contains(self, module))
            .unwrap_or(false)
    }

    /// Current members, sorted
    pub fn module_ids(&self) -> BTreeSet<ModuleId> {
        self.digraph()
            .map(|d| d.region_modules(self))
            .unwrap_or_default()
    }

    /// Connect this region (tail) to `head`
    pub fn connect_region(&self, head: &Region, filter: RegionFilter) -> RegionResult<()> {
        self.require_digraph()?.connect(self, filter, head)
    }

    /// Outgoing edges of this region
    pub fn edges(&self) -> Vec<FilteredRegion> {
        self.digraph()
            .map(|d| d.get_edges(self))
            .unwrap_or_default()
    }
}

impl PartialEq for Region {
    fn eq(&self, other: &Self) -> bool {
        self.digraph_id == other.digraph_id && self.name == other.name
    }
}

impl Eq for Region {}

impl Hash for Region {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.digraph_id.hash(state);
        self.name.hash(state);
    }
}

impl fmt::Debug for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Region")
            .field("name", &self.name)
            .field("digraph", &self.digraph_id)
            .finish()
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Head of an outgoing edge together with the edge's filter
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FilteredRegion {
    region: Region,
    filter: RegionFilter,
}

impl FilteredRegion {
    pub(crate) fn new(region: Region, filter: RegionFilter) -> Self {
        Self { region, filter }
    }

    pub fn region(&self) -> &Region {
        &self.region
    }

    pub fn filter(&self) -> &RegionFilter {
        &self.filter
    }
}
