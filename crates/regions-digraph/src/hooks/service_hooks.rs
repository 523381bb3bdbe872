// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Service find and service event hooks.

use super::{HookBinding, HookKind, Target, VisibilityHook};
use crate::model::{ServiceDescriptor, ServiceEvent};
use crate::types::ModuleId;

/// Filters service lookups
#[derive(Clone)]
pub struct ServiceFindHook {
    binding: HookBinding,
}

impl ServiceFindHook {
    pub(crate) fn new(binding: HookBinding) -> Self {
        Self { binding }
    }

    /// Retain only the services visible to `viewer`
    pub fn find(&self, viewer: ModuleId, candidates: &mut Vec<ServiceDescriptor>) {
        self.binding
            .retain_visible(viewer, candidates, |service| Target::Service(service));
    }
}

impl VisibilityHook for ServiceFindHook {
    fn kind(&self) -> HookKind {
        HookKind::ServiceFind
    }

    fn is_visible(&self, viewer: ModuleId, target: Target<'_>) -> bool {
        self.binding.is_visible(viewer, target)
    }
}

/// Filters service event delivery
#[derive(Clone)]
pub struct ServiceEventHook {
    binding: HookBinding,
}

impl ServiceEventHook {
    pub(crate) fn new(binding: HookBinding) -> Self {
        Self { binding }
    }

    /// Retain only the listeners that can see the event's service
    pub fn event(&self, event: &ServiceEvent, listeners: &mut Vec<ModuleId>) {
        if let Some(view) = self.binding.view() {
            listeners.retain(|listener| view.is_visible(*listener, Target::Service(&event.service)));
        }
    }
}

impl VisibilityHook for ServiceEventHook {
    fn kind(&self) -> HookKind {
        HookKind::ServiceEvent
    }

    fn is_visible(&self, viewer: ModuleId, target: Target<'_>) -> bool {
        self.binding.is_visible(viewer, target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::digraph::RegionDigraph;
    use crate::filter::{RegionFilterBuilder, VISIBLE_SERVICE_NAMESPACE};
    use crate::model::ServiceEventKind;

    fn setup() -> RegionDigraph {
        let digraph = RegionDigraph::default();
        let consumers = digraph.create_region("consumers").unwrap();
        let providers = digraph.create_region("providers").unwrap();
        consumers.add_module(ModuleId(1)).unwrap();
        providers.add_module(ModuleId(2)).unwrap();
        let filter = RegionFilterBuilder::new()
            .allow(VISIBLE_SERVICE_NAMESPACE, "(objectClass=Logger)")
            .build()
            .unwrap();
        digraph.connect(&consumers, filter, &providers).unwrap();
        digraph
    }

    fn service(id: u64, class: &str) -> ServiceDescriptor {
        ServiceDescriptor::new(id, ModuleId(2), vec![class.to_string()])
    }

    #[test]
    fn test_find_filters_by_object_class() {
        let digraph = setup();
        let hook = digraph.service_find_hook();

        let mut candidates = vec![service(10, "Logger"), service(11, "Metrics")];
        hook.find(ModuleId(1), &mut candidates);
        assert_eq!(candidates, vec![service(10, "Logger")]);

        // Providers cannot see back into consumers
        let consumer_service = ServiceDescriptor::new(12, ModuleId(1), vec!["Logger".to_string()]);
        assert!(!hook.is_visible(ModuleId(2), Target::Service(&consumer_service)));
    }

    #[test]
    fn test_event_filters_listeners() {
        let digraph = setup();
        let hook = digraph.service_event_hook();
        assert_eq!(hook.kind(), HookKind::ServiceEvent);

        let mut listeners = vec![ModuleId(1), ModuleId(2)];
        hook.event(
            &ServiceEvent::new(ServiceEventKind::Registered, service(11, "Metrics")),
            &mut listeners,
        );
        assert_eq!(listeners, vec![ModuleId(2)]);

        let mut listeners = vec![ModuleId(1), ModuleId(2)];
        hook.event(
            &ServiceEvent::new(ServiceEventKind::Modified, service(10, "Logger")),
            &mut listeners,
        );
        assert_eq!(listeners, vec![ModuleId(1), ModuleId(2)]);
    }
}
