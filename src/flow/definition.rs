// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 jetflow contributors

//! Flow definition structures
//!
//! A flow is an ordered list of component invocations. The position of an
//! invocation in the list is its address: connections point at downstream
//! invocations by index, and index 0 is always the trigger.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::component::ArgumentType;
use crate::errors::ValidationError;

/// Argument value supplied to a component invocation.
///
/// Decoded once from the submitted JSON; the validator dispatches on the
/// variant rather than inspecting raw JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ArgumentValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl ArgumentValue {
    /// The argument type this value satisfies
    pub fn kind(&self) -> ArgumentType {
        match self {
            Self::Bool(_) => ArgumentType::Bool,
            Self::Number(_) => ArgumentType::Number,
            Self::Text(_) => ArgumentType::String,
        }
    }

    /// Explicitly empty values are rejected like missing ones
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Text(s) if s.is_empty())
    }
}

impl From<&str> for ArgumentValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for ArgumentValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<f64> for ArgumentValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<bool> for ArgumentValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

/// Outgoing edges of an invocation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connections {
    /// Indices of downstream invocations
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub targets: Vec<usize>,
}

/// One component invocation inside a stored flow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentInvocation {
    /// Catalog key of the component
    pub key: String,

    /// Catalog version resolved at validation time
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub version: String,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub arguments: BTreeMap<String, ArgumentValue>,

    #[serde(default)]
    pub connections: Connections,
}

/// Record of a flow being submitted to a cluster namespace
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunnerAttachment {
    pub cluster: String,

    pub namespace: String,

    /// Runner software version stamped at attach time
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub version: String,
}

/// A named, persisted flow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowDefinition {
    pub name: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<ComponentInvocation>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub runners: Vec<RunnerAttachment>,
}

impl FlowDefinition {
    /// The entry-point invocation
    pub fn trigger(&self) -> Option<&ComponentInvocation> {
        self.components.first()
    }

    /// Existing attachment for a cluster, if any
    pub fn runner_for(&self, cluster: &str) -> Option<&RunnerAttachment> {
        self.runners.iter().find(|r| r.cluster == cluster)
    }
}

/// Connections as submitted by a client
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionsRequest {
    /// Accepted for compatibility; edges are derived from targets only
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<usize>,

    #[serde(default)]
    pub targets: Vec<usize>,
}

/// One invocation of a flow submission.
///
/// A client-supplied `version` is not part of the request; it is always
/// resolved from the catalog.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InvocationRequest {
    #[serde(default)]
    pub key: String,

    /// `None` records an explicit JSON `null`
    #[serde(default)]
    pub arguments: BTreeMap<String, Option<ArgumentValue>>,

    #[serde(default)]
    pub connections: ConnectionsRequest,
}

impl InvocationRequest {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ..Self::default()
        }
    }

    pub fn with_argument(mut self, key: impl Into<String>, value: impl Into<ArgumentValue>) -> Self {
        self.arguments.insert(key.into(), Some(value.into()));
        self
    }

    pub fn with_null_argument(mut self, key: impl Into<String>) -> Self {
        self.arguments.insert(key.into(), None);
        self
    }

    pub fn with_targets(mut self, targets: impl IntoIterator<Item = usize>) -> Self {
        self.connections.targets = targets.into_iter().collect();
        self
    }
}

/// A flow as submitted by a client, before validation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlowSubmission {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub components: Vec<InvocationRequest>,
}

impl FlowSubmission {
    pub fn new(name: impl Into<String>, components: Vec<InvocationRequest>) -> Self {
        Self {
            name: name.into(),
            components,
        }
    }

    /// Decode a submission from JSON.
    ///
    /// Values outside the closed argument types (arrays, objects) and
    /// negative targets are rejected here.
    pub fn from_json(json: &str) -> Result<Self, ValidationError> {
        serde_json::from_str(json).map_err(|e| ValidationError::InvalidSubmission {
            reason: e.to_string(),
        })
    }

    /// Load a submission from a file
    pub fn from_file(path: &std::path::Path) -> Result<Self, crate::JetflowError> {
        let content = std::fs::read_to_string(path).map_err(|e| crate::JetflowError::Io {
            message: format!("failed to read '{}': {}", path.display(), e),
        })?;

        Self::from_json(&content).map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_submission() {
        let json = r##"{
            "name": "alerts",
            "components": [
                {
                    "key": "webhook",
                    "version": "9.9.9",
                    "arguments": {"url": "https://x", "retries": 3, "verbose": true},
                    "connections": {"targets": [1]}
                },
                {"key": "notify", "arguments": {"channel": null}}
            ]
        }"##;

        let submission = FlowSubmission::from_json(json).unwrap();
        assert_eq!(submission.name, "alerts");

        let trigger = &submission.components[0];
        assert_eq!(trigger.arguments["url"], Some(ArgumentValue::Text("https://x".into())));
        assert_eq!(trigger.arguments["retries"], Some(ArgumentValue::Number(3.0)));
        assert_eq!(trigger.arguments["verbose"], Some(ArgumentValue::Bool(true)));
        assert_eq!(trigger.connections.targets, vec![1]);

        assert_eq!(submission.components[1].arguments["channel"], None);
        assert!(submission.components[1].connections.targets.is_empty());
    }

    #[test]
    fn test_reject_structured_argument_values() {
        let json = r#"{"name": "f", "components": [{"key": "a", "arguments": {"x": [1, 2]}}]}"#;
        let err = FlowSubmission::from_json(json).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidSubmission { .. }));
    }

    #[test]
    fn test_reject_negative_targets() {
        let json = r#"{"name": "f", "components": [{"key": "a", "connections": {"targets": [-1]}}]}"#;
        assert!(FlowSubmission::from_json(json).is_err());
    }

    #[test]
    fn test_definition_json_shape() {
        let definition = FlowDefinition {
            name: "alerts".into(),
            components: vec![ComponentInvocation {
                key: "webhook".into(),
                version: "1.0".into(),
                arguments: BTreeMap::from([("url".to_string(), ArgumentValue::from("https://x"))]),
                connections: Connections { targets: vec![1] },
            }],
            runners: vec![],
        };

        let json = serde_json::to_string(&definition).unwrap();
        assert_eq!(
            json,
            r#"{"name":"alerts","components":[{"key":"webhook","version":"1.0","arguments":{"url":"https://x"},"connections":{"targets":[1]}}]}"#
        );

        let parsed: FlowDefinition = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, definition);
        assert!(parsed.runner_for("prod").is_none());
    }
}
