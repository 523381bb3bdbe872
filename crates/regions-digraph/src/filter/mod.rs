// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Region filters.

A [`RegionFilter`] is attached to every edge of the digraph and decides which
modules, services and capabilities of the head region are visible through that
edge. Filters are built once with [`RegionFilterBuilder`]; expression syntax
errors surface at `build()` and never at evaluation time.

## Namespaces

Clauses are grouped by namespace. A module is tested against the
[`VISIBLE_MODULE_NAMESPACE`] clauses, a service against
[`VISIBLE_SERVICE_NAMESPACE`], a capability against its own namespace.
Clauses under [`VISIBLE_ALL_NAMESPACE`] apply to every namespace.

A filter without any clause is unconstrained and admits everything.
*/

pub mod attributes;
pub mod expr;

use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

pub use attributes::{AttributeValue, Attributes, Version};
pub use expr::{Comparison, FilterExpr};

use crate::model::{Capability, ModuleDescriptor, ServiceDescriptor};
use crate::types::RegionResult;

/// Modules (find hooks, resolver module-level requirements)
pub const VISIBLE_MODULE_NAMESPACE: &str = "region.visible.module";
/// Module lifecycle events; falls back to the module namespace
pub const VISIBLE_MODULE_LIFECYCLE_NAMESPACE: &str = "region.visible.module.lifecycle";
/// Exported packages
pub const VISIBLE_PACKAGE_NAMESPACE: &str = "region.visible.package";
/// Module-to-module requirements
pub const VISIBLE_REQUIRE_NAMESPACE: &str = "region.visible.require";
/// Fragment hosts
pub const VISIBLE_HOST_NAMESPACE: &str = "region.visible.host";
/// Services
pub const VISIBLE_SERVICE_NAMESPACE: &str = "region.visible.service";
/// Clauses in this namespace apply to every namespace
pub const VISIBLE_ALL_NAMESPACE: &str = "region.visible.all";

/// Module version attribute key
pub const MODULE_VERSION_ATTRIBUTE: &str = "module-version";
/// Module id attribute key
pub const MODULE_ID_ATTRIBUTE: &str = "id";
/// Service id attribute key
pub const SERVICE_ID_ATTRIBUTE: &str = "service.id";
/// Service interface names attribute key
pub const OBJECT_CLASS_ATTRIBUTE: &str = "objectClass";

/// Matches any attribute map
const ALL_FILTER: &str = "(|(!(all=*))(all=*))";

/// Immutable, cheaply clonable edge filter
///
/// Two filters are equal iff their serialized clauses are equal, namespace by
/// namespace.
#[derive(Clone)]
pub struct RegionFilter {
    inner: Arc<FilterInner>,
}

struct FilterInner {
    clauses: BTreeMap<String, Vec<FilterExpr>>,
    /// Serialized clauses; identity for `Eq` and `Hash`
    policy: BTreeMap<String, Vec<String>>,
    /// Display form only, namespaces are not escaped
    canonical: String,
}

impl RegionFilter {
    /// Filter with no clauses (admits everything)
    pub fn unconstrained() -> Self {
        Self::from_clauses(BTreeMap::new())
    }

    fn from_clauses(clauses: BTreeMap<String, Vec<FilterExpr>>) -> Self {
        let policy: BTreeMap<String, Vec<String>> = clauses
            .iter()
            .map(|(ns, exprs)| (ns.clone(), exprs.iter().map(|e| e.to_string()).collect()))
            .collect();
        let canonical = policy
            .iter()
            .map(|(ns, parts)| format!("{}=[{}]", ns, parts.join(", ")))
            .collect::<Vec<_>>()
            .join("; ");
        Self {
            inner: Arc::new(FilterInner {
                clauses,
                policy,
                canonical,
            }),
        }
    }

    /// True if the filter carries no clause at all
    pub fn is_unconstrained(&self) -> bool {
        self.inner.clauses.is_empty()
    }

    /// Test an attribute map in the given namespace
    pub fn is_allowed(&self, namespace: &str, attributes: &Attributes) -> bool {
        if self.is_unconstrained() {
            return true;
        }
        self.matches_namespace(namespace, attributes)
            || self.matches_namespace(VISIBLE_ALL_NAMESPACE, attributes)
    }

    fn matches_namespace(&self, namespace: &str, attributes: &Attributes) -> bool {
        self.inner
            .clauses
            .get(namespace)
            .map(|exprs| exprs.iter().any(|e| e.matches(attributes)))
            .unwrap_or(false)
    }

    pub fn is_module_allowed(&self, module: &ModuleDescriptor) -> bool {
        self.is_allowed(VISIBLE_MODULE_NAMESPACE, &module.to_attributes())
    }

    /// Lifecycle clauses first, then the module namespace
    pub fn is_module_lifecycle_allowed(&self, module: &ModuleDescriptor) -> bool {
        let attributes = module.to_attributes();
        self.is_allowed(VISIBLE_MODULE_LIFECYCLE_NAMESPACE, &attributes)
            || self.is_allowed(VISIBLE_MODULE_NAMESPACE, &attributes)
    }

    pub fn is_service_allowed(&self, service: &ServiceDescriptor) -> bool {
        self.is_allowed(VISIBLE_SERVICE_NAMESPACE, &service.to_attributes())
    }

    pub fn is_capability_allowed(&self, capability: &Capability) -> bool {
        self.is_allowed(&capability.namespace, &capability.attributes)
    }

    /// Clause strings per namespace, in the form accepted by [`RegionFilterBuilder::allow`]
    pub fn sharing_policy(&self) -> BTreeMap<String, Vec<String>> {
        self.inner.policy.clone()
    }

    /// Rebuild a filter from [`RegionFilter::sharing_policy`] output
    pub fn from_sharing_policy(policy: &BTreeMap<String, Vec<String>>) -> RegionResult<Self> {
        let mut builder = RegionFilterBuilder::new();
        for (namespace, clauses) in policy {
            for clause in clauses {
                builder = builder.allow(namespace.clone(), clause.clone());
            }
        }
        builder.build()
    }
}

impl PartialEq for RegionFilter {
    fn eq(&self, other: &Self) -> bool {
        self.inner.policy == other.inner.policy
    }
}

impl Eq for RegionFilter {}

impl Hash for RegionFilter {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.inner.policy.hash(state);
    }
}

impl fmt::Display for RegionFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}}", self.inner.canonical)
    }
}

impl fmt::Debug for RegionFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RegionFilter{}", self)
    }
}

impl Default for RegionFilter {
    fn default() -> Self {
        Self::unconstrained()
    }
}

/// Accumulates allow clauses; `build()` yields their union
#[derive(Debug, Clone, Default)]
pub struct RegionFilterBuilder {
    clauses: BTreeMap<String, Vec<String>>,
}

impl RegionFilterBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allow whatever matches `filter` in `namespace`
    pub fn allow(mut self, namespace: impl Into<String>, filter: impl Into<String>) -> Self {
        let entry = self.clauses.entry(namespace.into()).or_default();
        let filter = filter.into();
        if !entry.contains(&filter) {
            entry.push(filter);
        }
        self
    }

    /// Allow everything in `namespace`
    pub fn allow_all(self, namespace: impl Into<String>) -> Self {
        self.allow(namespace, ALL_FILTER)
    }

    /// Parse every clause and freeze the filter
    ///
    /// # Errors
    ///
    /// Returns [`crate::RegionError::InvalidFilterSyntax`] for the first malformed clause
    pub fn build(&self) -> RegionResult<RegionFilter> {
        let mut parsed: BTreeMap<String, Vec<FilterExpr>> = BTreeMap::new();
        for (namespace, clauses) in &self.clauses {
            let exprs = parsed.entry(namespace.clone()).or_default();
            for clause in clauses {
                let expr = FilterExpr::parse(clause)?;
                if !exprs.contains(&expr) {
                    exprs.push(expr);
                }
            }
        }
        Ok(RegionFilter::from_clauses(parsed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ModuleId, RegionError};

    fn module(name: &str, version: Version) -> ModuleDescriptor {
        ModuleDescriptor::new(ModuleId(1), name, version)
    }

    #[test]
    fn test_default_filter_admits_everything() {
        let filter = RegionFilterBuilder::new().build().unwrap();
        assert!(filter.is_unconstrained());
        assert!(filter.is_module_allowed(&module("anything", Version::default())));
        assert_eq!(filter, RegionFilter::unconstrained());
    }

    #[test]
    fn test_allow_is_a_union() {
        let filter = RegionFilterBuilder::new()
            .allow(VISIBLE_MODULE_NAMESPACE, "(region.visible.module=b1)")
            .allow(VISIBLE_MODULE_NAMESPACE, "(region.visible.module=b2)")
            .build()
            .unwrap();

        assert!(filter.is_module_allowed(&module("b1", Version::default())));
        assert!(filter.is_module_allowed(&module("b2", Version::default())));
        assert!(!filter.is_module_allowed(&module("b3", Version::default())));
    }

    #[test]
    fn test_namespace_isolation() {
        let filter = RegionFilterBuilder::new()
            .allow(VISIBLE_SERVICE_NAMESPACE, "(objectClass=Logger)")
            .build()
            .unwrap();

        // Module namespace has no clauses, so modules are not admitted
        assert!(!filter.is_module_allowed(&module("b1", Version::default())));

        let service = ServiceDescriptor::new(7, ModuleId(1), vec!["Logger".to_string()]);
        assert!(filter.is_service_allowed(&service));
    }

    #[test]
    fn test_all_namespace_applies_everywhere() {
        let filter = RegionFilterBuilder::new()
            .allow_all(VISIBLE_ALL_NAMESPACE)
            .build()
            .unwrap();
        assert!(filter.is_module_allowed(&module("b1", Version::default())));
        let service = ServiceDescriptor::new(7, ModuleId(1), vec!["Logger".to_string()]);
        assert!(filter.is_service_allowed(&service));
    }

    #[test]
    fn test_lifecycle_falls_back_to_module_namespace() {
        let filter = RegionFilterBuilder::new()
            .allow(VISIBLE_MODULE_NAMESPACE, "(region.visible.module=b1)")
            .build()
            .unwrap();
        assert!(filter.is_module_lifecycle_allowed(&module("b1", Version::default())));
        assert!(!filter.is_module_lifecycle_allowed(&module("b2", Version::default())));
    }

    #[test]
    fn test_version_clause() {
        let filter = RegionFilterBuilder::new()
            .allow(
                VISIBLE_MODULE_NAMESPACE,
                "(&(region.visible.module=b1)(module-version>=1.0)(!(module-version>=2.0)))",
            )
            .build()
            .unwrap();
        assert!(filter.is_module_allowed(&module("b1", Version::new(1, 4, 0))));
        assert!(!filter.is_module_allowed(&module("b1", Version::new(2, 0, 0))));
    }

    #[test]
    fn test_equality_by_serialized_form() {
        let a = RegionFilterBuilder::new()
            .allow("b", " ( b=x)")
            .allow("a", "(a=x)")
            .build()
            .unwrap();
        let b = RegionFilterBuilder::new()
            .allow("a", "(a=x)")
            .allow("b", "(b=x)")
            .build()
            .unwrap();
        let c = RegionFilterBuilder::new().allow("a", "(a=y)").build().unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_namespace_punctuation_does_not_collide() {
        let split = RegionFilterBuilder::new()
            .allow("a", "(x=1)")
            .allow("b", "(y=2)")
            .build()
            .unwrap();
        let merged = RegionFilterBuilder::new()
            .allow("a=[(x=1)]; b", "(y=2)")
            .build()
            .unwrap();
        assert_eq!(split.to_string(), merged.to_string());
        assert_ne!(split, merged);

        let mut set = std::collections::HashSet::new();
        set.insert(split);
        set.insert(merged);
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_invalid_syntax_reported_at_build() {
        let builder = RegionFilterBuilder::new().allow("a", "(a=x");
        assert!(matches!(builder.build(), Err(RegionError::InvalidFilterSyntax(_))));
    }

    #[test]
    fn test_sharing_policy_round_trip() {
        let filter = RegionFilterBuilder::new()
            .allow("a", "(a=x)")
            .allow_all("b")
            .build()
            .unwrap();
        let policy = filter.sharing_policy();
        assert_eq!(policy["a"], vec!["(a=x)".to_string()]);
        let rebuilt = RegionFilter::from_sharing_policy(&policy).unwrap();
        assert_eq!(rebuilt, filter);
    }
}
