// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Attribute values that filters are evaluated against.
//!
//! Attribute maps are string keyed. Key lookup is exact first, then ASCII
//! case-insensitive, so `Module-Version` and `module-version` name the same key.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::types::{RegionError, RegionResult};

/// String keyed attribute dictionary
pub type Attributes = BTreeMap<String, AttributeValue>;

/// Look up an attribute, falling back to a case-insensitive key match
pub fn lookup<'a>(attributes: &'a Attributes, key: &str) -> Option<&'a AttributeValue> {
    attributes.get(key).or_else(|| {
        attributes
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v)
    })
}

/// A typed attribute value
///
/// Filter literals are coerced to the type of the attribute they are compared
/// with, so `(module-version>=1.2)` compares versions while `(size>=10)`
/// compares integers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttributeValue {
    String(String),
    Long(i64),
    Boolean(bool),
    Version(Version),
    List(Vec<AttributeValue>),
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => write!(f, "{}", s),
            Self::Long(n) => write!(f, "{}", n),
            Self::Boolean(b) => write!(f, "{}", b),
            Self::Version(v) => write!(f, "{}", v),
            Self::List(items) => {
                let parts: Vec<String> = items.iter().map(|i| i.to_string()).collect();
                write!(f, "[{}]", parts.join(", "))
            }
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<i64> for AttributeValue {
    fn from(n: i64) -> Self {
        Self::Long(n)
    }
}

impl From<bool> for AttributeValue {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

impl From<Version> for AttributeValue {
    fn from(v: Version) -> Self {
        Self::Version(v)
    }
}

impl<T: Into<AttributeValue>> From<Vec<T>> for AttributeValue {
    fn from(items: Vec<T>) -> Self {
        Self::List(items.into_iter().map(Into::into).collect())
    }
}

/// Module version: `major[.minor[.micro[.qualifier]]]`
///
/// Ordered numerically on the three numeric parts, then lexically on the
/// qualifier. An empty string parses as `0.0.0`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub micro: u64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub qualifier: String,
}

impl Version {
    pub fn new(major: u64, minor: u64, micro: u64) -> Self {
        Self {
            major,
            minor,
            micro,
            qualifier: String::new(),
        }
    }

    pub fn with_qualifier(mut self, qualifier: impl Into<String>) -> Self {
        self.qualifier = qualifier.into();
        self
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.major
            .cmp(&other.major)
            .then(self.minor.cmp(&other.minor))
            .then(self.micro.cmp(&other.micro))
            .then_with(|| self.qualifier.cmp(&other.qualifier))
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.micro)?;
        if !self.qualifier.is_empty() {
            write!(f, ".{}", self.qualifier)?;
        }
        Ok(())
    }
}

impl FromStr for Version {
    type Err = RegionError;

    fn from_str(s: &str) -> RegionResult<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Ok(Version::default());
        }

        let invalid = || RegionError::InvalidFilterSyntax(format!("invalid version: {}", s));
        let mut parts = s.splitn(4, '.');
        let mut numeric = [0u64; 3];
        for slot in numeric.iter_mut() {
            match parts.next() {
                Some(part) => *slot = part.parse::<u64>().map_err(|_| invalid())?,
                None => break,
            }
        }

        let qualifier = parts.next().unwrap_or("").to_string();
        if !qualifier
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(invalid());
        }

        Ok(Version {
            major: numeric[0],
            minor: numeric[1],
            micro: numeric[2],
            qualifier,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_parsing() {
        assert_eq!("1".parse::<Version>().unwrap(), Version::new(1, 0, 0));
        assert_eq!("1.2.3".parse::<Version>().unwrap(), Version::new(1, 2, 3));
        assert_eq!(
            "1.2.3.beta-1".parse::<Version>().unwrap(),
            Version::new(1, 2, 3).with_qualifier("beta-1")
        );
        assert_eq!("".parse::<Version>().unwrap(), Version::default());
        assert!("1.x".parse::<Version>().is_err());
        assert!("1.2.3.bad!".parse::<Version>().is_err());
    }

    #[test]
    fn test_version_ordering() {
        let v = |s: &str| s.parse::<Version>().unwrap();
        assert!(v("1.10") > v("1.9"));
        assert!(v("2") > v("1.99.99"));
        assert!(v("1.0.0.b") > v("1.0.0.a"));
        assert!(v("1.0.0.a") > v("1.0.0"));
        assert_eq!(v("1.0"), v("1.0.0"));
    }

    #[test]
    fn test_lookup_case_insensitive() {
        let mut attrs = Attributes::new();
        attrs.insert("Module-Version".to_string(), AttributeValue::from("1.0"));
        assert!(lookup(&attrs, "module-version").is_some());
        assert!(lookup(&attrs, "Module-Version").is_some());
        assert!(lookup(&attrs, "module-name").is_none());
    }

    #[test]
    fn test_display() {
        let list = AttributeValue::from(vec!["a", "b"]);
        assert_eq!(list.to_string(), "[a, b]");
        assert_eq!(Version::new(1, 2, 0).to_string(), "1.2.0");
    }
}
