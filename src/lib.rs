// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Regions
//!
//! Isolation regions for a modular runtime. Modules are grouped into regions;
//! regions are connected by directed edges carrying filters that decide what a
//! module in the tail region may see of the head region.
//!
//! ## Quick Start
//!
//! ```toml
//! [dependencies]
//! regions = "0.1"
//! ```
//!
//! ```rust
//! use regions::prelude::*;
//!
//! let digraph = RegionDigraph::new(DigraphConfig::default());
//! let app = digraph.create_region("app")?;
//! let system = digraph.create_region("system")?;
//! app.add_module(ModuleId(1))?;
//! system.add_module(ModuleId(2))?;
//!
//! let filter = digraph
//!     .create_region_filter_builder()
//!     .allow_all(VISIBLE_MODULE_NAMESPACE)
//!     .build()?;
//! digraph.connect(&app, filter, &system)?;
//!
//! let api = ModuleDescriptor::new(ModuleId(2), "system.api", Version::default());
//! assert!(digraph.is_visible(ModuleId(1), Target::Module(&api)));
//! # Ok::<(), RegionError>(())
//! ```
//!
//! ## Feature Flags
//! - **`file-logging`**: per-crate JSON log files (see [`observability`])
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  Foundation: regions-config                             │
//! │  (TOML + environment + CLI overrides)                   │
//! └─────────────────────────────────────────────────────────┘
//!                         ↓
//! ┌─────────────────────────────────────────────────────────┐
//! │  Core: regions-digraph                                  │
//! │  (Regions, filters, copy/replace, visibility hooks)     │
//! └─────────────────────────────────────────────────────────┘
//!                         ↓
//! ┌─────────────────────────────────────────────────────────┐
//! │  Infrastructure: regions-observability                  │
//! │  (Console and file logging, per-crate debug flags)      │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## License
//!
//! Apache-2.0

pub use regions_config as config;
pub use regions_digraph as digraph;
pub use regions_observability as observability;

/// Prelude - commonly used types and traits
pub mod prelude {
    pub use crate::config::{DigraphConfig, RegionsConfig};
    pub use crate::digraph::{
        DigraphSnapshot, FilteredRegion, GraphViolation, ModuleDescriptor, ModuleEvent,
        ModuleEventKind, ModuleId, Region, RegionDigraph, RegionDigraphVisitor, RegionError,
        RegionFilter, RegionFilterBuilder, RegionResult, ServiceDescriptor, ServiceEvent,
        ServiceEventKind, Target, Version, VisibilityHook, VISIBLE_ALL_NAMESPACE,
        VISIBLE_MODULE_LIFECYCLE_NAMESPACE, VISIBLE_MODULE_NAMESPACE, VISIBLE_SERVICE_NAMESPACE,
    };
}
