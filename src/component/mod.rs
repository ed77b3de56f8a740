// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 jetflow contributors

//! Component catalog
//!
//! Components are reusable, versioned pipeline steps. Their specs come
//! from an external [`ComponentSource`] and are read-only here: the flow
//! validator checks submissions against them and copies the resolved
//! version into every invocation.

mod descriptor;
mod source;

pub use descriptor::{ArgumentDescriptor, ComponentDescriptor};
pub use source::{ComponentSource, DirectoryCatalog, StaticCatalog};

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::errors::JetflowResult;

/// Declared type of a component argument
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ArgumentType {
    String,
    Number,
    Bool,
}

impl std::fmt::Display for ArgumentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::String => write!(f, "string"),
            Self::Number => write!(f, "number"),
            Self::Bool => write!(f, "bool"),
        }
    }
}

impl std::str::FromStr for ArgumentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "string" => Ok(Self::String),
            "number" => Ok(Self::Number),
            "bool" => Ok(Self::Bool),
            _ => Err(format!("unknown argument type: {}", s)),
        }
    }
}

/// One argument declared by a component
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ArgumentSpec {
    pub key: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,

    #[serde(rename = "type")]
    pub kind: ArgumentType,

    pub required: bool,
}

impl ArgumentSpec {
    pub fn new(key: impl Into<String>, kind: ArgumentType, required: bool) -> Self {
        Self {
            key: key.into(),
            name: String::new(),
            description: String::new(),
            kind,
            required,
        }
    }
}

/// A component as published in the catalog
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ComponentSpec {
    pub key: String,

    pub version: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,

    /// Whether this component can start a flow
    pub trigger: bool,

    #[serde(default)]
    pub arguments: Vec<ArgumentSpec>,
}

impl ComponentSpec {
    pub fn new(key: impl Into<String>, version: impl Into<String>, trigger: bool) -> Self {
        Self {
            key: key.into(),
            version: version.into(),
            name: String::new(),
            description: String::new(),
            trigger,
            arguments: Vec::new(),
        }
    }

    /// Builder-style argument declaration
    pub fn with_argument(mut self, argument: ArgumentSpec) -> Self {
        self.arguments.push(argument);
        self
    }

    /// Look up a declared argument
    pub fn argument(&self, key: &str) -> Option<&ArgumentSpec> {
        self.arguments.iter().find(|a| a.key == key)
    }

    /// Declared arguments that must be supplied
    pub fn required_arguments(&self) -> impl Iterator<Item = &ArgumentSpec> {
        self.arguments.iter().filter(|a| a.required)
    }
}

/// The set of components a flow may be built from.
///
/// Order is preserved from the source and `(key, version)` pairs are
/// deduplicated, first occurrence wins. Lookups by key return the first
/// matching entry, which keeps version resolution deterministic.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(from = "Vec<ComponentSpec>", into = "Vec<ComponentSpec>")]
pub struct Catalog {
    specs: Vec<ComponentSpec>,
}

impl Catalog {
    pub fn new(specs: impl IntoIterator<Item = ComponentSpec>) -> Self {
        let mut seen = HashSet::new();
        let specs = specs
            .into_iter()
            .filter(|s| seen.insert((s.key.clone(), s.version.clone())))
            .collect();
        Self { specs }
    }

    /// Load the catalog from a source
    pub async fn load(source: &dyn ComponentSource) -> JetflowResult<Self> {
        let specs = source.list_component_specs().await?;
        let catalog = Self::new(specs);
        tracing::info!(components = catalog.len(), "component catalog loaded");
        Ok(catalog)
    }

    /// Find the spec a flow invocation with this key resolves to
    pub fn find(&self, key: &str) -> Option<&ComponentSpec> {
        self.specs.iter().find(|s| s.key == key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ComponentSpec> {
        self.specs.iter()
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}

impl From<Vec<ComponentSpec>> for Catalog {
    fn from(specs: Vec<ComponentSpec>) -> Self {
        Self::new(specs)
    }
}

impl From<Catalog> for Vec<ComponentSpec> {
    fn from(catalog: Catalog) -> Self {
        catalog.specs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_dedupes_key_and_version() {
        let catalog = Catalog::new(vec![
            ComponentSpec::new("webhook", "1.0", true),
            ComponentSpec::new("webhook", "1.0", true),
            ComponentSpec::new("webhook", "1.1", true),
            ComponentSpec::new("notify", "1.0", false),
        ]);

        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog.find("webhook").unwrap().version, "1.0");
        assert!(catalog.find("missing").is_none());
    }

    #[test]
    fn test_argument_type_serde() {
        let spec = ComponentSpec::new("notify", "2", false)
            .with_argument(ArgumentSpec::new("channel", ArgumentType::String, true))
            .with_argument(ArgumentSpec::new("retries", ArgumentType::Number, false));

        let json = serde_json::to_value(&spec).unwrap();
        assert_eq!(json["arguments"][0]["type"], "string");
        assert_eq!(json["arguments"][1]["type"], "number");

        assert_eq!(spec.required_arguments().count(), 1);
        assert_eq!(spec.argument("retries").unwrap().kind, ArgumentType::Number);
    }
}
