// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Immutable digraph state.
//!
//! A published [`DigraphState`] is never mutated. Writers clone it, apply one
//! operation to the clone and publish the result. Every method that changes
//! the state validates first, so an `Err` leaves the clone untouched.

use ahash::AHashMap;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use crate::filter::RegionFilter;
use crate::types::{GraphViolation, ModuleId, RegionError, RegionResult};

/// Generation stamp paired with the state it describes
#[derive(Debug)]
pub(crate) struct Published {
    pub(crate) generation: u64,
    pub(crate) state: Arc<DigraphState>,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct DigraphState {
    /// region name -> assigned modules
    regions: AHashMap<Arc<str>, BTreeSet<ModuleId>>,
    /// tail -> head -> filter
    edges: AHashMap<Arc<str>, BTreeMap<Arc<str>, RegionFilter>>,
    /// module -> owning region
    module_index: AHashMap<ModuleId, Arc<str>>,
    default_region: Option<Arc<str>>,
}

impl DigraphState {
    pub(crate) fn contains_region(&self, name: &str) -> bool {
        self.regions.contains_key(name)
    }

    /// Region names, sorted
    pub(crate) fn region_names(&self) -> Vec<Arc<str>> {
        let mut names: Vec<Arc<str>> = self.regions.keys().cloned().collect();
        names.sort();
        names
    }

    pub(crate) fn region_name(&self, name: &str) -> Option<&Arc<str>> {
        self.regions.get_key_value(name).map(|(k, _)| k)
    }

    pub(crate) fn modules_of(&self, name: &str) -> Option<&BTreeSet<ModuleId>> {
        self.regions.get(name)
    }

    pub(crate) fn region_of_module(&self, module: ModuleId) -> Option<&Arc<str>> {
        self.module_index.get(&module)
    }

    /// Outgoing edges of `tail`, ordered by head name
    pub(crate) fn edges_from<'a>(
        &'a self,
        tail: &str,
    ) -> impl Iterator<Item = (&'a Arc<str>, &'a RegionFilter)> + 'a {
        self.edges.get(tail).into_iter().flat_map(|heads| heads.iter())
    }

    pub(crate) fn edge_count(&self) -> usize {
        self.edges.values().map(BTreeMap::len).sum()
    }

    pub(crate) fn default_region(&self) -> Option<&Arc<str>> {
        self.default_region.as_ref()
    }

    fn require_region(&self, name: &str) -> RegionResult<Arc<str>> {
        self.region_name(name)
            .cloned()
            .ok_or_else(|| RegionError::UnknownRegion(name.to_string()))
    }

    // ------------------------------------------------------------------
    // Mutations: each returns whether the state changed
    // ------------------------------------------------------------------

    pub(crate) fn add_region(&mut self, name: &str) -> RegionResult<Arc<str>> {
        if name.trim().is_empty() {
            return Err(RegionError::InvalidName(
                "region name cannot be empty".to_string(),
            ));
        }
        if self.regions.contains_key(name) {
            return Err(RegionError::DuplicateRegion(name.to_string()));
        }
        let name: Arc<str> = Arc::from(name);
        self.regions.insert(name.clone(), BTreeSet::new());
        Ok(name)
    }

    /// Drops the region, every edge touching it and its module assignments
    pub(crate) fn remove_region(&mut self, name: &str) -> bool {
        let modules = match self.regions.remove(name) {
            Some(modules) => modules,
            None => return false,
        };

        for module in &modules {
            self.module_index.remove(module);
        }
        self.edges.remove(name);
        for heads in self.edges.values_mut() {
            heads.remove(name);
        }
        self.edges.retain(|_, heads| !heads.is_empty());

        if self.default_region.as_deref() == Some(name) {
            self.default_region = None;
        }
        true
    }

    pub(crate) fn add_edge(
        &mut self,
        tail: &str,
        filter: RegionFilter,
        head: &str,
    ) -> RegionResult<()> {
        if tail == head {
            return Err(GraphViolation::SelfLoop(tail.to_string()).into());
        }
        let tail = self.require_region(tail)?;
        let head = self.require_region(head)?;

        let heads = self.edges.entry(tail.clone()).or_default();
        if heads.contains_key(&head) {
            return Err(GraphViolation::DuplicateEdge {
                tail: tail.to_string(),
                head: head.to_string(),
            }
            .into());
        }
        heads.insert(head, filter);
        Ok(())
    }

    pub(crate) fn remove_edge(&mut self, tail: &str, head: &str) -> bool {
        let removed = match self.edges.get_mut(tail) {
            Some(heads) => heads.remove(head).is_some(),
            None => false,
        };
        if removed && self.edges.get(tail).map_or(false, BTreeMap::is_empty) {
            self.edges.remove(tail);
        }
        removed
    }

    /// Assign a module; `Ok(false)` if it is already in this region
    pub(crate) fn add_module(&mut self, region: &str, module: ModuleId) -> RegionResult<bool> {
        let region = self.require_region(region)?;
        if let Some(owner) = self.module_index.get(&module) {
            if *owner == region {
                return Ok(false);
            }
            return Err(GraphViolation::ModuleAlreadyAssigned {
                module,
                region: owner.to_string(),
            }
            .into());
        }

        self.module_index.insert(module, region.clone());
        if let Some(modules) = self.regions.get_mut(&region) {
            modules.insert(module);
        }
        Ok(true)
    }

    pub(crate) fn remove_module(&mut self, region: &str, module: ModuleId) -> bool {
        let removed = self
            .regions
            .get_mut(region)
            .map_or(false, |modules| modules.remove(&module));
        if removed {
            self.module_index.remove(&module);
        }
        removed
    }

    pub(crate) fn set_default_region(&mut self, region: Option<&str>) -> RegionResult<bool> {
        let next = match region {
            Some(name) => Some(self.require_region(name)?),
            None => None,
        };
        if next == self.default_region {
            return Ok(false);
        }
        self.default_region = next;
        Ok(true)
    }

    /// Structural equality (regions, module sets, edges, default region)
    pub(crate) fn same_structure(&self, other: &DigraphState) -> bool {
        if self.regions != other.regions || self.default_region != other.default_region {
            return false;
        }
        let edges = |state: &DigraphState| -> BTreeSet<(Arc<str>, Arc<str>, String)> {
            state
                .edges
                .iter()
                .flat_map(|(tail, heads)| {
                    heads
                        .iter()
                        .map(move |(head, filter)| (tail.clone(), head.clone(), filter.to_string()))
                })
                .collect()
        };
        edges(self) == edges(other)
    }

    /// Check every structural invariant; used by tests
    #[cfg(test)]
    pub(crate) fn check_invariants(&self) -> Result<(), String> {
        for (module, owner) in &self.module_index {
            match self.regions.get(owner) {
                Some(modules) if modules.contains(module) => {}
                _ => return Err(format!("module {} indexed to {} but not a member", module, owner)),
            }
        }
        for (region, modules) in &self.regions {
            for module in modules {
                if self.module_index.get(module) != Some(region) {
                    return Err(format!("module {} of {} missing from index", module, region));
                }
            }
        }
        for (tail, heads) in &self.edges {
            if !self.regions.contains_key(tail) {
                return Err(format!("edge tail {} is not a region", tail));
            }
            for head in heads.keys() {
                if head == tail {
                    return Err(format!("self loop on {}", tail));
                }
                if !self.regions.contains_key(head) {
                    return Err(format!("edge head {} is not a region", head));
                }
            }
        }
        Ok(())
    }
}
