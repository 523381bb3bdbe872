// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
# Regions Digraph

Isolation regions for a modular runtime, connected by filtered edges.

A region groups modules that see each other unconditionally. A directed edge
from region `A` to region `B` lets modules in `A` see whatever in `B` the edge's
[`RegionFilter`] admits. Visibility is transitive over filtered paths.

This crate provides:
- [`RegionDigraph`]: the graph container with optimistic copy/replace
- [`RegionFilter`] and [`RegionFilterBuilder`]: LDAP-style namespaced filters
- hooks that answer visibility questions for module lookups, lifecycle and
  service events and capability resolution
- [`DigraphSnapshot`]: serializable form for persistence

## Example
```rust
use regions_digraph::{ModuleId, RegionDigraph, VISIBLE_MODULE_NAMESPACE};

let digraph = RegionDigraph::default();
let app = digraph.create_region("app")?;
let system = digraph.create_region("system")?;
app.add_module(ModuleId(10))?;

let filter = digraph
    .create_region_filter_builder()
    .allow(VISIBLE_MODULE_NAMESPACE, "(region.visible.module=system.api)")
    .build()?;
digraph.connect(&app, filter, &system)?;
assert_eq!(digraph.get_edges(&app).len(), 1);
# Ok::<(), regions_digraph::RegionError>(())
```

Copyright 2025 Neuraville Inc.
Licensed under the Apache License, Version 2.0
*/

pub mod digraph;
pub mod filter;
pub mod hooks;
pub mod model;
pub mod persistence;
pub mod region;
pub mod types;

pub use digraph::visitor::RegionDigraphVisitor;
pub use digraph::RegionDigraph;

pub use filter::{
    AttributeValue, Attributes, RegionFilter, RegionFilterBuilder, Version,
    VISIBLE_ALL_NAMESPACE, VISIBLE_HOST_NAMESPACE, VISIBLE_MODULE_LIFECYCLE_NAMESPACE,
    VISIBLE_MODULE_NAMESPACE, VISIBLE_PACKAGE_NAMESPACE, VISIBLE_REQUIRE_NAMESPACE,
    VISIBLE_SERVICE_NAMESPACE,
};

pub use hooks::{
    HookKind, ModuleEventHook, ModuleFindHook, RegionResolverHook, ResolverHookFactory,
    ServiceEventHook, ServiceFindHook, Target, VisibilityHook,
};

pub use model::{
    Capability, ModuleDescriptor, ModuleEvent, ModuleEventKind, ServiceDescriptor, ServiceEvent,
    ServiceEventKind,
};

pub use persistence::{DigraphSnapshot, EdgeRecord, RegionRecord, SNAPSHOT_FORMAT_VERSION};
pub use region::{FilteredRegion, Region};
pub use types::{GraphViolation, ModuleId, RegionError, RegionResult};

// Digraph settings live in the config crate
pub use regions_config::{DigraphConfig, RegionsConfig};
