// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Resolver hook.

A resolve operation obtains a [`RegionResolverHook`] from the factory, asks it
to filter candidates any number of times and ends it. The hook pins the state
snapshot taken at `begin`, so a single resolve sees one consistent digraph even
if it is mutated meanwhile.
*/

use tracing::trace;

use super::{HookBinding, HookKind, Target, VisibilityHook, VisibilityView};
use crate::model::{Capability, ModuleDescriptor};
use crate::types::ModuleId;

/// Produces one [`RegionResolverHook`] per resolve operation
#[derive(Clone)]
pub struct ResolverHookFactory {
    binding: HookBinding,
}

impl ResolverHookFactory {
    pub(crate) fn new(binding: HookBinding) -> Self {
        Self { binding }
    }

    /// Start a resolve operation triggered by `triggers`
    pub fn begin(&self, triggers: &[ModuleId]) -> RegionResolverHook {
        trace!(target: "regions-digraph", "Resolve started for {} trigger modules", triggers.len());
        RegionResolverHook {
            view: self.binding.view(),
            triggers: triggers.to_vec(),
        }
    }
}

/// Filters resolver candidates against a pinned state snapshot
pub struct RegionResolverHook {
    /// `None` when the digraph was already dropped
    view: Option<VisibilityView>,
    triggers: Vec<ModuleId>,
}

impl RegionResolverHook {
    pub fn triggers(&self) -> &[ModuleId] {
        &self.triggers
    }

    /// Every module stays resolvable; visibility is enforced on matches
    pub fn filter_resolvable(&self, _candidates: &mut Vec<ModuleDescriptor>) {}

    /// Retain the collision candidates visible from the singleton's provider
    pub fn filter_singleton_collisions(
        &self,
        singleton: &Capability,
        candidates: &mut Vec<Capability>,
    ) {
        self.filter_matches(singleton.provider, candidates);
    }

    /// Retain the capabilities `requirer` can see
    pub fn filter_matches(&self, requirer: ModuleId, candidates: &mut Vec<Capability>) {
        if let Some(view) = &self.view {
            candidates.retain(|capability| view.is_visible(requirer, Target::Capability(capability)));
        }
    }

    /// Finish the resolve operation and release the snapshot
    pub fn end(self) {
        trace!(target: "regions-digraph", "Resolve finished for {} trigger modules", self.triggers.len());
    }
}

impl VisibilityHook for RegionResolverHook {
    fn kind(&self) -> HookKind {
        HookKind::Resolver
    }

    fn is_visible(&self, viewer: ModuleId, target: Target<'_>) -> bool {
        self.view
            .as_ref()
            .map_or(true, |view| view.is_visible(viewer, target))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::digraph::RegionDigraph;
    use crate::filter::{RegionFilterBuilder, VISIBLE_PACKAGE_NAMESPACE};

    fn package(provider: u64, name: &str) -> Capability {
        Capability::new(VISIBLE_PACKAGE_NAMESPACE, ModuleId(provider))
            .with_attribute(VISIBLE_PACKAGE_NAMESPACE, name)
    }

    fn setup() -> RegionDigraph {
        let digraph = RegionDigraph::default();
        let app = digraph.create_region("app").unwrap();
        let lib = digraph.create_region("lib").unwrap();
        app.add_module(ModuleId(1)).unwrap();
        lib.add_module(ModuleId(2)).unwrap();
        let filter = RegionFilterBuilder::new()
            .allow(VISIBLE_PACKAGE_NAMESPACE, "(region.visible.package=lib.api)")
            .build()
            .unwrap();
        digraph.connect(&app, filter, &lib).unwrap();
        digraph
    }

    #[test]
    fn test_filter_matches() {
        let digraph = setup();
        let hook = digraph.resolver_hook_factory().begin(&[ModuleId(1)]);
        assert_eq!(hook.triggers(), &[ModuleId(1)]);

        let mut candidates = vec![package(2, "lib.api"), package(2, "lib.impl"), package(1, "app.util")];
        hook.filter_matches(ModuleId(1), &mut candidates);
        assert_eq!(candidates, vec![package(2, "lib.api"), package(1, "app.util")]);
        hook.end();
    }

    #[test]
    fn test_snapshot_is_pinned_until_end() {
        let digraph = setup();
        let hook = digraph.resolver_hook_factory().begin(&[]);

        // Cut the edge after the resolve started
        let app = digraph.get_region("app").unwrap();
        let lib = digraph.get_region("lib").unwrap();
        digraph.disconnect(&app, &lib).unwrap();

        let mut candidates = vec![package(2, "lib.api")];
        hook.filter_matches(ModuleId(1), &mut candidates);
        assert_eq!(candidates.len(), 1);
        hook.end();

        let hook = digraph.resolver_hook_factory().begin(&[]);
        let mut candidates = vec![package(2, "lib.api")];
        hook.filter_matches(ModuleId(1), &mut candidates);
        assert!(candidates.is_empty());
    }

    #[test]
    fn test_singleton_collisions() {
        let digraph = setup();
        let hook = digraph.resolver_hook_factory().begin(&[]);
        let singleton = package(1, "app.singleton");

        let mut collisions = vec![package(2, "lib.api"), package(2, "lib.impl")];
        hook.filter_singleton_collisions(&singleton, &mut collisions);
        assert_eq!(collisions, vec![package(2, "lib.api")]);

        let mut resolvable = vec![ModuleDescriptor::new(ModuleId(2), "lib", Default::default())];
        hook.filter_resolvable(&mut resolvable);
        assert_eq!(resolvable.len(), 1);
    }
}
