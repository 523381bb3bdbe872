// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Module find and module event hooks.

use tracing::{debug, warn};

use super::{HookBinding, HookKind, Target, VisibilityHook, VisibilityView};
use crate::digraph::RegionDigraph;
use crate::model::{ModuleDescriptor, ModuleEvent, ModuleEventKind};
use crate::types::ModuleId;

/// Filters module lookups down to the modules the viewer can see
#[derive(Clone)]
pub struct ModuleFindHook {
    binding: HookBinding,
}

impl ModuleFindHook {
    pub(crate) fn new(binding: HookBinding) -> Self {
        Self { binding }
    }

    /// Retain only the candidates visible to `viewer`
    pub fn find(&self, viewer: ModuleId, candidates: &mut Vec<ModuleDescriptor>) {
        self.binding
            .retain_visible(viewer, candidates, |module| Target::Module(module));
    }
}

impl VisibilityHook for ModuleFindHook {
    fn kind(&self) -> HookKind {
        HookKind::ModuleFind
    }

    fn is_visible(&self, viewer: ModuleId, target: Target<'_>) -> bool {
        self.binding.is_visible(viewer, target)
    }
}

/// Filters module lifecycle event delivery and tracks installs and uninstalls
///
/// An installed module joins the region of the module that installed it, or
/// the digraph's default region when the installer has none. An uninstalled
/// module leaves its region once the event has been filtered.
#[derive(Clone)]
pub struct ModuleEventHook {
    binding: HookBinding,
}

impl ModuleEventHook {
    pub(crate) fn new(binding: HookBinding) -> Self {
        Self { binding }
    }

    /// Retain only the listeners that can see the event's module
    pub fn event(&self, event: &ModuleEvent, listeners: &mut Vec<ModuleId>) {
        let digraph = match self.binding.digraph() {
            Some(digraph) => digraph,
            None => return,
        };

        if event.kind == ModuleEventKind::Installed {
            assign_installed(&digraph, event);
        }

        let view = VisibilityView::new(digraph.load(), digraph.config());
        listeners.retain(|listener| {
            view.is_visible(*listener, Target::ModuleLifecycle(&event.module))
        });

        if event.kind == ModuleEventKind::Uninstalled {
            release_uninstalled(&digraph, event.module.id);
        }
    }
}

impl VisibilityHook for ModuleEventHook {
    fn kind(&self) -> HookKind {
        HookKind::ModuleEvent
    }

    fn is_visible(&self, viewer: ModuleId, target: Target<'_>) -> bool {
        self.binding.is_visible(viewer, target)
    }
}

fn assign_installed(digraph: &RegionDigraph, event: &ModuleEvent) {
    let module = event.module.id;
    if digraph.region_of(module).is_some() {
        return;
    }

    let region = match digraph
        .region_of(event.origin)
        .or_else(|| digraph.default_region())
    {
        Some(region) => region,
        None => {
            debug!(
                target: "regions-digraph",
                "Installed module {} left unassigned: installer {} has no region and there is no default region",
                module, event.origin
            );
            return;
        }
    };

    if let Err(e) = digraph.add_module(&region, module) {
        warn!(
            target: "regions-digraph",
            "Failed to assign installed module {} to region {}: {}",
            module, region, e
        );
    }
}

fn release_uninstalled(digraph: &RegionDigraph, module: ModuleId) {
    if let Some(region) = digraph.region_of(module) {
        if let Err(e) = digraph.remove_module(&region, module) {
            warn!(
                target: "regions-digraph",
                "Failed to remove uninstalled module {} from region {}: {}",
                module, region, e
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{RegionFilterBuilder, Version, VISIBLE_MODULE_NAMESPACE};

    fn module(id: u64, name: &str) -> ModuleDescriptor {
        ModuleDescriptor::new(ModuleId(id), name, Version::new(1, 0, 0))
    }

    #[test]
    fn test_install_joins_installer_region() {
        let digraph = RegionDigraph::default();
        let apps = digraph.create_region("apps").unwrap();
        apps.add_module(ModuleId(1)).unwrap();

        let hook = digraph.module_event_hook();
        let mut listeners = vec![ModuleId(1)];
        hook.event(
            &ModuleEvent::new(ModuleEventKind::Installed, module(2, "new"), ModuleId(1)),
            &mut listeners,
        );

        assert_eq!(digraph.region_of(ModuleId(2)), Some(apps));
        assert_eq!(listeners, vec![ModuleId(1)]);
    }

    #[test]
    fn test_install_falls_back_to_default_region() {
        let digraph = RegionDigraph::default();
        let root = digraph.create_region("root").unwrap();
        digraph.set_default_region(Some(&root)).unwrap();

        let hook = digraph.module_event_hook();
        hook.event(
            &ModuleEvent::new(ModuleEventKind::Installed, module(5, "new"), ModuleId(99)),
            &mut Vec::new(),
        );
        assert_eq!(digraph.region_of(ModuleId(5)), Some(root));
    }

    #[test]
    fn test_uninstall_is_filtered_then_released() {
        let digraph = RegionDigraph::default();
        let a = digraph.create_region("a").unwrap();
        let b = digraph.create_region("b").unwrap();
        a.add_module(ModuleId(1)).unwrap();
        b.add_module(ModuleId(2)).unwrap();
        b.add_module(ModuleId(3)).unwrap();

        let hook = digraph.module_event_hook();
        let mut listeners = vec![ModuleId(1), ModuleId(3)];
        hook.event(
            &ModuleEvent::new(ModuleEventKind::Uninstalled, module(2, "gone"), ModuleId(2)),
            &mut listeners,
        );

        assert_eq!(listeners, vec![ModuleId(3)]);
        assert!(digraph.region_of(ModuleId(2)).is_none());
    }

    #[test]
    fn test_find_hook() {
        let digraph = RegionDigraph::default();
        let a = digraph.create_region("a").unwrap();
        let b = digraph.create_region("b").unwrap();
        a.add_module(ModuleId(1)).unwrap();
        b.add_module(ModuleId(2)).unwrap();
        b.add_module(ModuleId(3)).unwrap();
        let filter = RegionFilterBuilder::new()
            .allow(VISIBLE_MODULE_NAMESPACE, "(region.visible.module=shared)")
            .build()
            .unwrap();
        digraph.connect(&a, filter, &b).unwrap();

        let hook = digraph.module_find_hook();
        assert_eq!(hook.kind(), HookKind::ModuleFind);

        let mut candidates = vec![module(1, "self"), module(2, "shared"), module(3, "private")];
        hook.find(ModuleId(1), &mut candidates);
        let names: Vec<&str> = candidates.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["self", "shared"]);
    }
}
