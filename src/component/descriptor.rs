// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 jetflow contributors

//! `spec.yml` component descriptors
//!
//! Every component repository carries a YAML descriptor. All fields are
//! optional at the decoding stage so that a missing field produces a
//! precise message instead of a generic YAML error.

use serde::Deserialize;

use super::{ArgumentSpec, ArgumentType, ComponentSpec};
use crate::errors::JetflowError;

/// Raw `spec.yml` contents
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ComponentDescriptor {
    /// Either a string (`"1.2.0"`) or a YAML number (`1.2`)
    #[serde(default)]
    pub version: Option<serde_yaml::Value>,

    #[serde(default)]
    pub key: Option<String>,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub trigger: Option<bool>,

    #[serde(default)]
    pub arguments: Option<Vec<ArgumentDescriptor>>,
}

/// Raw argument entry of a descriptor
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ArgumentDescriptor {
    #[serde(default)]
    pub key: Option<String>,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default, rename = "type")]
    pub kind: Option<String>,

    #[serde(default)]
    pub required: Option<bool>,
}

fn non_empty(field: Option<String>) -> Option<String> {
    field.filter(|s| !s.trim().is_empty())
}

fn version_text(value: Option<serde_yaml::Value>) -> Option<String> {
    match value? {
        serde_yaml::Value::String(s) if !s.trim().is_empty() => Some(s),
        serde_yaml::Value::Number(n) if n.as_f64() != Some(0.0) => Some(n.to_string()),
        _ => None,
    }
}

impl ComponentDescriptor {
    /// Parse a descriptor from YAML
    pub fn from_yaml(yaml: &str) -> Result<Self, JetflowError> {
        serde_yaml::from_str(yaml).map_err(Into::into)
    }

    /// Check every field is present and turn the descriptor into a spec
    pub fn into_spec(self) -> Result<ComponentSpec, String> {
        let version =
            version_text(self.version).ok_or("component 'version' field is missing")?;
        let key = non_empty(self.key).ok_or("component 'key' field is missing")?;
        let name = non_empty(self.name).ok_or("component 'name' field is missing")?;
        let description =
            non_empty(self.description).ok_or("component 'description' field is missing")?;
        let trigger = self.trigger.ok_or("component 'trigger' field is missing")?;

        let arguments = match self.arguments {
            Some(args) if !args.is_empty() => args,
            _ => return Err("component 'arguments' field is missing".to_string()),
        };

        let arguments = arguments
            .into_iter()
            .enumerate()
            .map(|(i, arg)| arg.into_spec(i))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ComponentSpec {
            key,
            version,
            name,
            description,
            trigger,
            arguments,
        })
    }
}

impl ArgumentDescriptor {
    fn into_spec(self, index: usize) -> Result<ArgumentSpec, String> {
        let missing = |field: &str| format!("component argument {} '{}' field is missing", index, field);

        let key = non_empty(self.key).ok_or_else(|| missing("key"))?;
        let name = non_empty(self.name).ok_or_else(|| missing("name"))?;
        let description = non_empty(self.description).ok_or_else(|| missing("description"))?;
        let kind = non_empty(self.kind).ok_or_else(|| missing("type"))?;
        let kind: ArgumentType = kind
            .parse()
            .map_err(|_| format!("component argument {} 'type' field is not valid", index))?;
        let required = self.required.ok_or_else(|| missing("required"))?;

        Ok(ArgumentSpec {
            key,
            name,
            description,
            kind,
            required,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WEBHOOK: &str = r#"
version: 1.2
key: webhook
name: Webhook
description: Starts a flow on an incoming HTTP call
trigger: true
arguments:
  - key: url
    name: URL
    description: Endpoint to listen on
    type: string
    required: true
  - key: timeout
    name: Timeout
    description: Seconds before giving up
    type: number
    required: false
"#;

    #[test]
    fn test_parse_descriptor() {
        let spec = ComponentDescriptor::from_yaml(WEBHOOK)
            .unwrap()
            .into_spec()
            .unwrap();

        assert_eq!(spec.key, "webhook");
        assert_eq!(spec.version, "1.2");
        assert!(spec.trigger);
        assert_eq!(spec.arguments.len(), 2);
        assert_eq!(spec.arguments[1].kind, ArgumentType::Number);
        assert!(!spec.arguments[1].required);
    }

    #[test]
    fn test_string_version_is_kept_verbatim() {
        let yaml = WEBHOOK.replace("version: 1.2", "version: \"2.0.1\"");
        let spec = ComponentDescriptor::from_yaml(&yaml)
            .unwrap()
            .into_spec()
            .unwrap();
        assert_eq!(spec.version, "2.0.1");
    }

    fn reject(yaml: &str) -> String {
        ComponentDescriptor::from_yaml(yaml)
            .unwrap()
            .into_spec()
            .unwrap_err()
    }

    #[test]
    fn test_missing_fields_are_named() {
        let cases = [
            ("version: 1.2\n", "", "component 'version' field is missing"),
            ("version: 1.2", "version: 0", "component 'version' field is missing"),
            ("version: 1.2", "version: \"  \"", "component 'version' field is missing"),
            ("key: webhook\n", "", "component 'key' field is missing"),
            ("key: webhook", "key: \"   \"", "component 'key' field is missing"),
            ("name: Webhook\n", "", "component 'name' field is missing"),
            ("name: Webhook", "name: \"\"", "component 'name' field is missing"),
            (
                "description: Starts a flow on an incoming HTTP call\n",
                "",
                "component 'description' field is missing",
            ),
            ("trigger: true\n", "", "component 'trigger' field is missing"),
            (
                "  - key: url\n    name: URL\n",
                "  - name: URL\n",
                "component argument 0 'key' field is missing",
            ),
            (
                "    name: Timeout\n",
                "",
                "component argument 1 'name' field is missing",
            ),
            (
                "description: Endpoint to listen on",
                "description: \" \"",
                "component argument 0 'description' field is missing",
            ),
            (
                "    type: string\n",
                "",
                "component argument 0 'type' field is missing",
            ),
            (
                "    required: false\n",
                "",
                "component argument 1 'required' field is missing",
            ),
        ];

        for (find, replace, expected) in cases {
            assert!(WEBHOOK.contains(find), "fixture lacks {:?}", find);
            let yaml = WEBHOOK.replacen(find, replace, 1);
            assert_eq!(reject(&yaml), expected, "after replacing {:?}", find);
        }
    }

    #[test]
    fn test_missing_or_empty_arguments() {
        let (head, _) = WEBHOOK.split_once("arguments:").unwrap();

        assert_eq!(reject(head), "component 'arguments' field is missing");
        assert_eq!(
            reject(&format!("{}arguments: []\n", head)),
            "component 'arguments' field is missing"
        );
    }

    #[test]
    fn test_surrounding_whitespace_is_not_empty() {
        let yaml = WEBHOOK.replace("name: Webhook", "name: \"  Webhook \"");
        let spec = ComponentDescriptor::from_yaml(&yaml)
            .unwrap()
            .into_spec()
            .unwrap();
        assert_eq!(spec.name, "  Webhook ");
    }

    #[test]
    fn test_invalid_argument_type() {
        let yaml = WEBHOOK.replace("type: number", "type: duration");
        assert_eq!(reject(&yaml), "component argument 1 'type' field is not valid");
    }
}
