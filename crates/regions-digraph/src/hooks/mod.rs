// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Interception points consulted by the module runtime.

Every hook is bound to one digraph through a non-owning reference and answers
the same question: can module `viewer` see `target`? The answer is derived from
a single consistent state snapshot:

1. the configured system module sees everything
2. a module sees its own module, services and capabilities
3. if either side is not assigned to a region, the target is hidden; with
   strict isolation disabled in the configuration it is visible instead
4. otherwise the target is visible if it lives in the viewer's region or its
   region is reachable from the viewer's region over edges whose filters admit
   the target

Once the digraph is dropped, hooks stop filtering.
*/

pub mod module_hooks;
pub mod resolver;
pub mod service_hooks;

use std::borrow::Cow;
use std::fmt;
use std::sync::{Arc, Weak};

use regions_config::DigraphConfig;

use crate::digraph::{region_reachable, DigraphInner, Published, RegionDigraph};
use crate::filter::{
    Attributes, RegionFilter, VISIBLE_MODULE_LIFECYCLE_NAMESPACE, VISIBLE_MODULE_NAMESPACE,
    VISIBLE_SERVICE_NAMESPACE,
};
use crate::model::{Capability, ModuleDescriptor, ServiceDescriptor};
use crate::types::ModuleId;

pub use module_hooks::{ModuleEventHook, ModuleFindHook};
pub use resolver::{RegionResolverHook, ResolverHookFactory};
pub use service_hooks::{ServiceEventHook, ServiceFindHook};

/// Which interception point a hook serves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookKind {
    Resolver,
    ModuleEvent,
    ModuleFind,
    ServiceEvent,
    ServiceFind,
}

impl fmt::Display for HookKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Resolver => "resolver",
            Self::ModuleEvent => "module-event",
            Self::ModuleFind => "module-find",
            Self::ServiceEvent => "service-event",
            Self::ServiceFind => "service-find",
        };
        write!(f, "{}", name)
    }
}

/// Something a module may or may not be allowed to see
#[derive(Debug, Clone, Copy)]
pub enum Target<'a> {
    /// A module, tested in the module namespace
    Module(&'a ModuleDescriptor),
    /// A module lifecycle event, tested in the lifecycle namespace then the module namespace
    ModuleLifecycle(&'a ModuleDescriptor),
    Service(&'a ServiceDescriptor),
    /// A capability, tested in its own namespace
    Capability(&'a Capability),
}

impl<'a> Target<'a> {
    /// Module that owns the target
    pub fn owner(&self) -> ModuleId {
        match self {
            Self::Module(m) | Self::ModuleLifecycle(m) => m.id,
            Self::Service(s) => s.owner,
            Self::Capability(c) => c.provider,
        }
    }

    fn attributes(&self) -> Cow<'a, Attributes> {
        match *self {
            Self::Module(m) | Self::ModuleLifecycle(m) => Cow::Owned(m.to_attributes()),
            Self::Service(s) => Cow::Owned(s.to_attributes()),
            Self::Capability(c) => Cow::Borrowed(&c.attributes),
        }
    }

    fn admitted_by(&self, filter: &RegionFilter, attributes: &Attributes) -> bool {
        match self {
            Self::Module(_) => filter.is_allowed(VISIBLE_MODULE_NAMESPACE, attributes),
            Self::ModuleLifecycle(_) => {
                filter.is_allowed(VISIBLE_MODULE_LIFECYCLE_NAMESPACE, attributes)
                    || filter.is_allowed(VISIBLE_MODULE_NAMESPACE, attributes)
            }
            Self::Service(_) => filter.is_allowed(VISIBLE_SERVICE_NAMESPACE, attributes),
            Self::Capability(c) => filter.is_allowed(&c.namespace, attributes),
        }
    }
}

/// Visibility decision shared by every hook
pub trait VisibilityHook: Send + Sync {
    fn kind(&self) -> HookKind;

    /// Can `viewer` see `target`?
    fn is_visible(&self, viewer: ModuleId, target: Target<'_>) -> bool;
}

/// One state snapshot plus the settings needed to evaluate visibility
pub(crate) struct VisibilityView {
    published: Arc<Published>,
    strict_isolation: bool,
    system_module: Option<ModuleId>,
}

impl VisibilityView {
    pub(crate) fn new(published: Arc<Published>, config: &DigraphConfig) -> Self {
        Self {
            published,
            strict_isolation: config.strict_isolation,
            system_module: config.system_module_id.map(ModuleId),
        }
    }

    pub(crate) fn is_visible(&self, viewer: ModuleId, target: Target<'_>) -> bool {
        if self.system_module == Some(viewer) {
            return true;
        }
        let owner = target.owner();
        if owner == viewer {
            return true;
        }

        let state = &self.published.state;
        let (viewer_region, target_region) =
            match (state.region_of_module(viewer), state.region_of_module(owner)) {
                (Some(v), Some(t)) => (v, t),
                _ => return !self.strict_isolation,
            };
        if viewer_region == target_region {
            return true;
        }

        let attributes = target.attributes();
        region_reachable(state, viewer_region, target_region, |filter| {
            target.admitted_by(filter, &attributes)
        })
    }
}

/// Non-owning link from a hook to its digraph
#[derive(Clone)]
pub(crate) struct HookBinding {
    digraph: Weak<DigraphInner>,
}

impl HookBinding {
    pub(crate) fn new(inner: &Arc<DigraphInner>) -> Self {
        Self {
            digraph: Arc::downgrade(inner),
        }
    }

    pub(crate) fn digraph(&self) -> Option<RegionDigraph> {
        self.digraph.upgrade().map(RegionDigraph::from_inner)
    }

    /// Snapshot of the current state; `None` once the digraph is gone
    pub(crate) fn view(&self) -> Option<VisibilityView> {
        self.digraph
            .upgrade()
            .map(|inner| VisibilityView::new(inner.load(), &inner.config))
    }

    pub(crate) fn is_visible(&self, viewer: ModuleId, target: Target<'_>) -> bool {
        self.view()
            .map_or(true, |view| view.is_visible(viewer, target))
    }

    /// Drop candidates `viewer` cannot see
    pub(crate) fn retain_visible<T>(
        &self,
        viewer: ModuleId,
        candidates: &mut Vec<T>,
        target: impl Fn(&T) -> Target<'_>,
    ) {
        if let Some(view) = self.view() {
            candidates.retain(|candidate| view.is_visible(viewer, target(candidate)));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{RegionFilterBuilder, Version};

    fn module(id: u64, name: &str) -> ModuleDescriptor {
        ModuleDescriptor::new(ModuleId(id), name, Version::new(1, 0, 0))
    }

    fn digraph(config: DigraphConfig) -> RegionDigraph {
        let digraph = RegionDigraph::new(config);
        let a = digraph.create_region("a").unwrap();
        let b = digraph.create_region("b").unwrap();
        a.add_module(ModuleId(1)).unwrap();
        b.add_module(ModuleId(2)).unwrap();
        b.add_module(ModuleId(3)).unwrap();
        let filter = RegionFilterBuilder::new()
            .allow(VISIBLE_MODULE_NAMESPACE, "(region.visible.module=b.api)")
            .build()
            .unwrap();
        digraph.connect(&a, filter, &b).unwrap();
        digraph
    }

    #[test]
    fn test_rules() {
        let digraph = digraph(DigraphConfig {
            system_module_id: Some(0),
            ..DigraphConfig::default()
        });
        let api = module(2, "b.api");
        let internal = module(3, "b.internal");
        let outsider = module(9, "outsider");

        assert!(digraph.is_visible(ModuleId(1), Target::Module(&api)));
        assert!(!digraph.is_visible(ModuleId(1), Target::Module(&internal)));
        assert!(digraph.is_visible(ModuleId(2), Target::Module(&internal)));
        assert!(!digraph.is_visible(ModuleId(2), Target::Module(&module(1, "a.main"))));
        assert!(digraph.is_visible(ModuleId(0), Target::Module(&internal)));
        assert!(digraph.is_visible(ModuleId(3), Target::Module(&internal)));

        // Unassigned on either side: no path, no visibility
        assert!(!digraph.is_visible(ModuleId(1), Target::Module(&outsider)));
        assert!(!digraph.is_visible(ModuleId(9), Target::Module(&internal)));
        assert!(digraph.is_visible(ModuleId(9), Target::Module(&outsider)));
        assert!(digraph.is_visible(ModuleId(0), Target::Module(&outsider)));
    }

    #[test]
    fn test_unassigned_modules_with_isolation_disabled() {
        let digraph = digraph(DigraphConfig {
            strict_isolation: false,
            ..DigraphConfig::default()
        });
        let outsider = module(9, "outsider");
        assert!(digraph.is_visible(ModuleId(1), Target::Module(&outsider)));
        assert!(digraph.is_visible(ModuleId(9), Target::Module(&module(3, "b.internal"))));

        // Assigned modules are still bound by edges
        assert!(!digraph.is_visible(ModuleId(1), Target::Module(&module(3, "b.internal"))));
    }

    #[test]
    fn test_find_hook_drops_unassigned_by_default() {
        let digraph = digraph(DigraphConfig::default());
        let mut candidates = vec![module(2, "b.api"), module(9, "stray")];
        digraph.module_find_hook().find(ModuleId(1), &mut candidates);
        assert_eq!(candidates, vec![module(2, "b.api")]);
    }

    #[test]
    fn test_lifecycle_and_capability_namespaces() {
        let digraph = digraph(DigraphConfig::default());
        assert!(digraph.is_visible(ModuleId(1), Target::ModuleLifecycle(&module(2, "b.api"))));

        let capability = Capability::new("region.visible.package", ModuleId(2))
            .with_attribute("region.visible.package", "b.api");
        assert!(!digraph.is_visible(ModuleId(1), Target::Capability(&capability)));
    }

    #[test]
    fn test_binding_stops_filtering_after_drop() {
        let digraph = digraph(DigraphConfig::default());
        let binding = HookBinding::new(digraph.inner());
        let internal = module(3, "b.internal");
        assert!(!binding.is_visible(ModuleId(1), Target::Module(&internal)));

        drop(digraph);
        assert!(binding.view().is_none());
        assert!(binding.is_visible(ModuleId(1), Target::Module(&internal)));
    }
}
