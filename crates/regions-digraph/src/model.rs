// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Descriptors supplied by the module-management system.

The digraph never owns modules or services. The host runtime hands these
plain values to the hooks, and filters are evaluated against the attribute
maps they publish.
*/

use serde::{Deserialize, Serialize};

use crate::filter::{
    AttributeValue, Attributes, Version, MODULE_ID_ATTRIBUTE, MODULE_VERSION_ATTRIBUTE,
    OBJECT_CLASS_ATTRIBUTE, SERVICE_ID_ATTRIBUTE, VISIBLE_MODULE_NAMESPACE,
};
use crate::types::ModuleId;

/// Ids above `i64::MAX` are published as their decimal string
fn id_attribute(id: u64) -> AttributeValue {
    i64::try_from(id)
        .map(AttributeValue::Long)
        .unwrap_or_else(|_| AttributeValue::String(id.to_string()))
}

/// An installed module as seen by filters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleDescriptor {
    pub id: ModuleId,
    pub name: String,
    pub version: Version,
    /// Additional namespaced attributes
    #[serde(default)]
    pub attributes: Attributes,
}

impl ModuleDescriptor {
    pub fn new(id: ModuleId, name: impl Into<String>, version: Version) -> Self {
        Self {
            id,
            name: name.into(),
            version,
            attributes: Attributes::new(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Attribute map for the module namespace
    ///
    /// The name is published under [`VISIBLE_MODULE_NAMESPACE`], the version
    /// under [`MODULE_VERSION_ATTRIBUTE`] and the id under [`MODULE_ID_ATTRIBUTE`].
    pub fn to_attributes(&self) -> Attributes {
        let mut attrs = self.attributes.clone();
        attrs.insert(
            VISIBLE_MODULE_NAMESPACE.to_string(),
            AttributeValue::String(self.name.clone()),
        );
        attrs.insert(
            MODULE_VERSION_ATTRIBUTE.to_string(),
            AttributeValue::Version(self.version.clone()),
        );
        attrs.insert(
            MODULE_ID_ATTRIBUTE.to_string(),
            id_attribute(self.id.0),
        );
        attrs
    }
}

/// A registered service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceDescriptor {
    pub service_id: u64,
    /// Module that registered the service
    pub owner: ModuleId,
    pub object_class: Vec<String>,
    #[serde(default)]
    pub properties: Attributes,
}

impl ServiceDescriptor {
    pub fn new(service_id: u64, owner: ModuleId, object_class: Vec<String>) -> Self {
        Self {
            service_id,
            owner,
            object_class,
            properties: Attributes::new(),
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn to_attributes(&self) -> Attributes {
        let mut attrs = self.properties.clone();
        attrs.insert(
            SERVICE_ID_ATTRIBUTE.to_string(),
            id_attribute(self.service_id),
        );
        attrs.insert(
            OBJECT_CLASS_ATTRIBUTE.to_string(),
            AttributeValue::from(self.object_class.clone()),
        );
        attrs
    }
}

/// A capability offered by a module (package export, host, module identity ...)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capability {
    /// Region filter namespace the capability is tested in
    pub namespace: String,
    pub provider: ModuleId,
    #[serde(default)]
    pub attributes: Attributes,
}

impl Capability {
    pub fn new(namespace: impl Into<String>, provider: ModuleId) -> Self {
        Self {
            namespace: namespace.into(),
            provider,
            attributes: Attributes::new(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }
}

/// Module lifecycle transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleEventKind {
    Installed,
    Resolved,
    Starting,
    Started,
    Stopping,
    Stopped,
    Updated,
    Unresolved,
    Uninstalled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleEvent {
    pub kind: ModuleEventKind,
    pub module: ModuleDescriptor,
    /// Module that caused the event (the installer for `Installed`)
    pub origin: ModuleId,
}

impl ModuleEvent {
    pub fn new(kind: ModuleEventKind, module: ModuleDescriptor, origin: ModuleId) -> Self {
        Self { kind, module, origin }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceEventKind {
    Registered,
    Modified,
    Unregistering,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceEvent {
    pub kind: ServiceEventKind,
    pub service: ServiceDescriptor,
}

impl ServiceEvent {
    pub fn new(kind: ServiceEventKind, service: ServiceDescriptor) -> Self {
        Self { kind, service }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_attributes() {
        let module = ModuleDescriptor::new(ModuleId(5), "core", Version::new(1, 2, 0))
            .with_attribute("vendor", "acme");
        let attrs = module.to_attributes();

        assert_eq!(attrs[VISIBLE_MODULE_NAMESPACE], AttributeValue::from("core"));
        assert_eq!(
            attrs[MODULE_VERSION_ATTRIBUTE],
            AttributeValue::Version(Version::new(1, 2, 0))
        );
        assert_eq!(attrs[MODULE_ID_ATTRIBUTE], AttributeValue::Long(5));
        assert_eq!(attrs["vendor"], AttributeValue::from("acme"));
    }

    #[test]
    fn test_service_attributes() {
        let service = ServiceDescriptor::new(9, ModuleId(2), vec!["Logger".to_string()])
            .with_property("ranking", 10i64);
        let attrs = service.to_attributes();

        assert_eq!(attrs[SERVICE_ID_ATTRIBUTE], AttributeValue::Long(9));
        assert_eq!(
            attrs[OBJECT_CLASS_ATTRIBUTE],
            AttributeValue::List(vec![AttributeValue::from("Logger")])
        );
        assert_eq!(attrs["ranking"], AttributeValue::Long(10));
    }

    #[test]
    fn test_ids_beyond_i64_keep_their_value() {
        use crate::filter::RegionFilterBuilder;

        let module = ModuleDescriptor::new(ModuleId(u64::MAX), "huge", Version::default());
        assert_eq!(
            module.to_attributes()[MODULE_ID_ATTRIBUTE],
            AttributeValue::String(u64::MAX.to_string())
        );

        let negative = RegionFilterBuilder::new()
            .allow(VISIBLE_MODULE_NAMESPACE, "(id<=0)")
            .build()
            .unwrap();
        assert!(!negative.is_module_allowed(&module));

        let exact = RegionFilterBuilder::new()
            .allow(VISIBLE_MODULE_NAMESPACE, "(id=18446744073709551615)")
            .build()
            .unwrap();
        assert!(exact.is_module_allowed(&module));

        let service = ServiceDescriptor::new(u64::MAX, ModuleId(1), Vec::new());
        assert_eq!(
            service.to_attributes()[SERVICE_ID_ATTRIBUTE],
            AttributeValue::String(u64::MAX.to_string())
        );
        let boundary = ServiceDescriptor::new(i64::MAX as u64, ModuleId(1), Vec::new());
        assert_eq!(
            boundary.to_attributes()[SERVICE_ID_ATTRIBUTE],
            AttributeValue::Long(i64::MAX)
        );
    }
}
