// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
The region digraph container.

## Concurrency

The published state is an immutable snapshot behind an [`ArcSwap`]. Readers
load the current snapshot and never block. Writers serialize on a mutex, clone
the snapshot, apply one validated mutation, bump the generation and publish the
result with a single store. A failed mutation publishes nothing.

## Copy and replace

[`RegionDigraph::copy`] produces an independent digraph stamped with the
origin's identity and generation. After mutating the copy,
[`RegionDigraph::replace`] installs its state into the origin, provided the
origin's generation has not moved since the stamp. On a conflict the caller
takes a fresh copy and retries.

```rust,ignore
let copy = digraph.copy();
let staging = copy.create_region("staging")?;
copy.connect(&staging, filter, &copy.get_region("core").unwrap())?;
digraph.replace(&copy)?;
```
*/

mod state;
mod visibility;
pub mod visitor;

use arc_swap::ArcSwap;
use parking_lot::Mutex;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

use regions_config::DigraphConfig;

use crate::filter::{RegionFilter, RegionFilterBuilder};
use crate::hooks::{
    HookBinding, ModuleEventHook, ModuleFindHook, ResolverHookFactory, ServiceEventHook,
    ServiceFindHook, Target, VisibilityView,
};
use crate::region::{FilteredRegion, Region};
use crate::types::{GraphViolation, ModuleId, RegionError, RegionResult};

pub(crate) use state::{DigraphState, Published};
pub(crate) use visibility::region_reachable;

static NEXT_DIGRAPH_ID: AtomicU64 = AtomicU64::new(1);

/// Stamp recorded on a copy
#[derive(Debug, Clone, Copy)]
struct CopyOrigin {
    digraph_id: u64,
    generation: u64,
}

/// Shared internals; regions and hooks hold `Weak` references to this
pub(crate) struct DigraphInner {
    pub(crate) id: u64,
    published: ArcSwap<Published>,
    write_lock: Mutex<()>,
    origin: Mutex<Option<CopyOrigin>>,
    pub(crate) config: DigraphConfig,
}

impl DigraphInner {
    /// Current snapshot
    pub(crate) fn load(&self) -> Arc<Published> {
        self.published.load_full()
    }
}

/// Directed graph of regions connected by filtered edges
///
/// Cloning a `RegionDigraph` yields another handle to the same digraph; use
/// [`RegionDigraph::copy`] for an independent one.
#[derive(Clone)]
pub struct RegionDigraph {
    inner: Arc<DigraphInner>,
}

impl RegionDigraph {
    /// Create an empty digraph
    ///
    /// If `config.default_region` is set, that region is created and made the
    /// default region for newly installed modules.
    pub fn new(config: DigraphConfig) -> Self {
        let mut state = DigraphState::default();
        let default_name = config.default_region.trim().to_string();
        if !default_name.is_empty() {
            let created = state
                .add_region(&default_name)
                .and_then(|name| state.set_default_region(Some(&name)));
            if let Err(e) = created {
                warn!(target: "regions-digraph", "Ignoring default region {:?}: {}", default_name, e);
            }
        }
        Self::with_state(config, 0, Arc::new(state), None)
    }

    fn with_state(
        config: DigraphConfig,
        generation: u64,
        state: Arc<DigraphState>,
        origin: Option<CopyOrigin>,
    ) -> Self {
        let id = NEXT_DIGRAPH_ID.fetch_add(1, Ordering::Relaxed);
        Self {
            inner: Arc::new(DigraphInner {
                id,
                published: ArcSwap::from_pointee(Published { generation, state }),
                write_lock: Mutex::new(()),
                origin: Mutex::new(origin),
                config,
            }),
        }
    }

    pub(crate) fn from_inner(inner: Arc<DigraphInner>) -> Self {
        Self { inner }
    }

    pub(crate) fn from_state(config: DigraphConfig, state: DigraphState) -> Self {
        Self::with_state(config, 0, Arc::new(state), None)
    }

    pub(crate) fn inner(&self) -> &Arc<DigraphInner> {
        &self.inner
    }

    pub(crate) fn load(&self) -> Arc<Published> {
        self.inner.load()
    }

    pub fn config(&self) -> &DigraphConfig {
        &self.inner.config
    }

    /// Number of state-changing mutations applied so far
    pub fn generation(&self) -> u64 {
        self.inner.published.load().generation
    }

    pub(crate) fn handle(&self, name: &Arc<str>) -> Region {
        Region::new(name.clone(), self.inner.id, Arc::downgrade(&self.inner))
    }

    fn check_owned(&self, region: &Region) -> RegionResult<()> {
        if region.digraph_id() == self.inner.id {
            Ok(())
        } else {
            Err(GraphViolation::ForeignRegion(region.name().to_string()).into())
        }
    }

    /// Apply `f` to a private clone of the state and publish it
    ///
    /// `f` returns the operation's value and whether the state changed; the
    /// generation only moves when it did.
    fn mutate<T>(
        &self,
        operation: fmt::Arguments<'_>,
        f: impl FnOnce(&mut DigraphState) -> RegionResult<(T, bool)>,
    ) -> RegionResult<T> {
        let _guard = self.inner.write_lock.lock();
        let current = self.inner.published.load_full();
        let mut next = DigraphState::clone(&current.state);

        let (value, changed) = f(&mut next)?;
        if changed {
            let generation = current.generation + 1;
            self.inner.published.store(Arc::new(Published {
                generation,
                state: Arc::new(next),
            }));
            debug!(target: "regions-digraph", "{} (generation {})", operation, generation);
        }
        Ok(value)
    }

    // ========================================================================
    // Regions
    // ========================================================================

    /// Create a region with the given unique name
    ///
    /// # Errors
    ///
    /// - [`RegionError::DuplicateRegion`] if the name is taken
    /// - [`RegionError::InvalidName`] if the name is blank
    pub fn create_region(&self, name: &str) -> RegionResult<Region> {
        let name = self.mutate(format_args!("Created region {}", name), |state| {
            Ok((state.add_region(name)?, true))
        })?;
        Ok(self.handle(&name))
    }

    /// Remove a region with all its edges and module assignments
    ///
    /// Returns `Ok(false)` if the region is no longer present.
    ///
    /// # Errors
    ///
    /// [`GraphViolation::ForeignRegion`] for a region of another digraph
    pub fn remove_region(&self, region: &Region) -> RegionResult<bool> {
        self.check_owned(region)?;
        self.mutate(format_args!("Removed region {}", region), |state| {
            let removed = state.remove_region(region.name());
            Ok((removed, removed))
        })
    }

    pub fn get_region(&self, name: &str) -> Option<Region> {
        self.load().state.region_name(name).map(|n| self.handle(n))
    }

    /// Snapshot of all regions, sorted by name
    pub fn get_regions(&self) -> Vec<Region> {
        self.load()
            .state
            .region_names()
            .iter()
            .map(|n| self.handle(n))
            .collect()
    }

    /// Region the module is assigned to
    pub fn region_of(&self, module: ModuleId) -> Option<Region> {
        self.load()
            .state
            .region_of_module(module)
            .map(|n| self.handle(n))
    }

    pub fn iter(&self) -> std::vec::IntoIter<Region> {
        self.get_regions().into_iter()
    }

    /// Region that installed modules join when their installer has none
    pub fn set_default_region(&self, region: Option<&Region>) -> RegionResult<()> {
        if let Some(region) = region {
            self.check_owned(region)?;
        }
        let name = region.map(Region::name);
        self.mutate(format_args!("Default region set to {:?}", name), |state| {
            Ok(((), state.set_default_region(name)?))
        })
    }

    pub fn default_region(&self) -> Option<Region> {
        self.load().state.default_region().map(|n| self.handle(n))
    }

    // ========================================================================
    // Modules
    // ========================================================================

    /// Assign a module to a region
    ///
    /// Adding a module to the region it already belongs to is a no-op.
    ///
    /// # Errors
    ///
    /// - [`GraphViolation::ModuleAlreadyAssigned`] if it belongs to another region
    /// - [`RegionError::UnknownRegion`] if the region was removed
    pub fn add_module(&self, region: &Region, module: ModuleId) -> RegionResult<()> {
        self.check_owned(region)?;
        self.mutate(
            format_args!("Added module {} to region {}", module, region),
            |state| Ok(((), state.add_module(region.name(), module)?)),
        )
    }

    pub fn remove_module(&self, region: &Region, module: ModuleId) -> RegionResult<bool> {
        self.check_owned(region)?;
        self.mutate(
            format_args!("Removed module {} from region {}", module, region),
            |state| {
                let removed = state.remove_module(region.name(), module);
                Ok((removed, removed))
            },
        )
    }

    pub(crate) fn region_contains(&self, region: &Region, module: ModuleId) -> bool {
        region.digraph_id() == self.inner.id
            && self
                .load()
                .state
                .modules_of(region.name())
                .map_or(false, |modules| modules.contains(&module))
    }

    pub(crate) fn region_modules(&self, region: &Region) -> BTreeSet<ModuleId> {
        if region.digraph_id() != self.inner.id {
            return BTreeSet::new();
        }
        self.load()
            .state
            .modules_of(region.name())
            .cloned()
            .unwrap_or_default()
    }

    // ========================================================================
    // Edges
    // ========================================================================

    /// Connect `tail` to `head` through `filter`
    ///
    /// Never replaces an existing edge; disconnect first.
    ///
    /// # Errors
    ///
    /// - [`GraphViolation::SelfLoop`] if `tail == head`
    /// - [`GraphViolation::DuplicateEdge`] if the edge already exists
    /// - [`GraphViolation::ForeignRegion`] if either region belongs to another digraph
    /// - [`RegionError::UnknownRegion`] if either region was removed
    pub fn connect(&self, tail: &Region, filter: RegionFilter, head: &Region) -> RegionResult<()> {
        self.check_owned(tail)?;
        self.check_owned(head)?;
        self.mutate(
            format_args!("Connected region {} to {} with {}", tail, head, filter),
            |state| {
                state.add_edge(tail.name(), filter.clone(), head.name())?;
                Ok(((), true))
            },
        )
    }

    /// Remove the edge from `tail` to `head`; `false` if there was none
    pub fn disconnect(&self, tail: &Region, head: &Region) -> RegionResult<bool> {
        self.check_owned(tail)?;
        self.check_owned(head)?;
        self.mutate(
            format_args!("Disconnected region {} from {}", tail, head),
            |state| {
                let removed = state.remove_edge(tail.name(), head.name());
                Ok((removed, removed))
            },
        )
    }

    /// Outgoing edges of `region`, ordered by head name
    ///
    /// Empty if the region is absent or belongs to another digraph.
    pub fn get_edges(&self, region: &Region) -> Vec<FilteredRegion> {
        if region.digraph_id() != self.inner.id {
            return Vec::new();
        }
        let published = self.load();
        published
            .state
            .edges_from(region.name())
            .map(|(head, filter)| FilteredRegion::new(self.handle(head), filter.clone()))
            .collect()
    }

    pub fn create_region_filter_builder(&self) -> RegionFilterBuilder {
        RegionFilterBuilder::new()
    }

    // ========================================================================
    // Copy / replace
    // ========================================================================

    /// Independent copy of the current state, stamped for [`RegionDigraph::replace`]
    pub fn copy(&self) -> RegionDigraph {
        let current = self.inner.published.load_full();
        let copy = Self::with_state(
            self.inner.config.clone(),
            current.generation,
            Arc::clone(&current.state),
            Some(CopyOrigin {
                digraph_id: self.inner.id,
                generation: current.generation,
            }),
        );
        debug!(
            target: "regions-digraph",
            "Copied digraph {} at generation {} as digraph {}",
            self.inner.id, current.generation, copy.inner.id
        );
        copy
    }

    /// Install the state of `copy`, if nothing changed since it was taken
    ///
    /// On success the copy is re-stamped with the new generation, so it can be
    /// mutated and replaced again.
    ///
    /// # Errors
    ///
    /// - [`GraphViolation::NotACopy`] if `copy` was not copied from this digraph
    /// - [`RegionError::ConcurrentModification`] if this digraph changed since the copy
    pub fn replace(&self, copy: &RegionDigraph) -> RegionResult<()> {
        // Reject before locking: the origin identity of a copy never changes
        let is_copy = copy
            .inner
            .origin
            .lock()
            .map_or(false, |origin| origin.digraph_id == self.inner.id);
        if !is_copy || Arc::ptr_eq(&self.inner, &copy.inner) {
            return Err(GraphViolation::NotACopy.into());
        }

        // Origin before copy; copies are always younger than their origin
        let _guard = self.inner.write_lock.lock();
        let _copy_guard = copy.inner.write_lock.lock();
        let mut origin = copy.inner.origin.lock();
        let expected = origin.map(|o| o.generation).unwrap_or_default();

        let current = self.inner.published.load_full();
        if current.generation != expected {
            warn!(
                target: "regions-digraph",
                "Rejected replace of digraph {}: copy taken at generation {}, now at {}",
                self.inner.id, expected, current.generation
            );
            return Err(RegionError::ConcurrentModification {
                expected,
                actual: current.generation,
            });
        }

        let replacement = copy.inner.published.load_full();
        let generation = current.generation + 1;
        self.inner.published.store(Arc::new(Published {
            generation,
            state: Arc::clone(&replacement.state),
        }));
        *origin = Some(CopyOrigin {
            digraph_id: self.inner.id,
            generation,
        });

        info!(
            target: "regions-digraph",
            "Replaced digraph {} with copy {} ({} regions, {} edges, generation {})",
            self.inner.id,
            copy.inner.id,
            replacement.state.region_names().len(),
            replacement.state.edge_count(),
            generation
        );
        Ok(())
    }

    // ========================================================================
    // Hooks
    // ========================================================================

    fn binding(&self) -> HookBinding {
        HookBinding::new(&self.inner)
    }

    pub fn resolver_hook_factory(&self) -> ResolverHookFactory {
        ResolverHookFactory::new(self.binding())
    }

    pub fn module_event_hook(&self) -> ModuleEventHook {
        ModuleEventHook::new(self.binding())
    }

    pub fn module_find_hook(&self) -> ModuleFindHook {
        ModuleFindHook::new(self.binding())
    }

    pub fn service_event_hook(&self) -> ServiceEventHook {
        ServiceEventHook::new(self.binding())
    }

    pub fn service_find_hook(&self) -> ServiceFindHook {
        ServiceFindHook::new(self.binding())
    }

    /// Evaluate visibility against the current state
    pub fn is_visible(&self, viewer: ModuleId, target: Target<'_>) -> bool {
        VisibilityView::new(self.load(), &self.inner.config).is_visible(viewer, target)
    }
}

impl Default for RegionDigraph {
    fn default() -> Self {
        Self::new(DigraphConfig::default())
    }
}

impl<'a> IntoIterator for &'a RegionDigraph {
    type Item = Region;
    type IntoIter = std::vec::IntoIter<Region>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl fmt::Debug for RegionDigraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let published = self.load();
        f.debug_struct("RegionDigraph")
            .field("id", &self.inner.id)
            .field("generation", &published.generation)
            .field("regions", &published.state.region_names())
            .field("edges", &published.state.edge_count())
            .finish()
    }
}
