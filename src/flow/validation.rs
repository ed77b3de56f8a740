// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 jetflow contributors

//! Flow validation
//!
//! Cross-checks a submission against the component catalog. Validation
//! is pure and fail-fast: the first problem found, in index order, is
//! returned with the offending index and field.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::component::{Catalog, ComponentSpec};
use crate::errors::ValidationError;
use crate::flow::{
    ComponentInvocation, Connections, FlowDefinition, FlowGraph, FlowSubmission,
    InvocationRequest,
};

/// Which invocations get their connection targets checked
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConnectionPolicy {
    /// Only the trigger's fan-out is checked
    #[default]
    TriggerOnly,
    /// Every invocation's targets are range-checked
    AllInvocations,
}

/// Validator settings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationOptions {
    #[serde(default)]
    pub connections: ConnectionPolicy,

    /// Reject cycles and invocations the trigger cannot reach
    #[serde(default)]
    pub require_acyclic_reachable: bool,
}

impl ValidationOptions {
    /// Strictest settings: all connections checked, graph must be a DAG
    /// reachable from the trigger
    pub fn strict() -> Self {
        Self {
            connections: ConnectionPolicy::AllInvocations,
            require_acyclic_reachable: true,
        }
    }
}

/// A flow that passed validation, with component versions resolved.
///
/// Only [`FlowValidator`] can produce one, which makes it the single
/// path by which a flow becomes persistable.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ValidatedFlow(FlowDefinition);

impl ValidatedFlow {
    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn definition(&self) -> &FlowDefinition {
        &self.0
    }

    pub fn into_definition(self) -> FlowDefinition {
        self.0
    }
}

/// Flow validator
#[derive(Debug, Clone, Default)]
pub struct FlowValidator {
    options: ValidationOptions,
}

impl FlowValidator {
    /// Validator with the default (trigger-only) connection policy
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ValidationOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> ValidationOptions {
        self.options
    }

    /// Validate a submission against the catalog
    pub fn validate(
        &self,
        submission: &FlowSubmission,
        catalog: &Catalog,
    ) -> Result<ValidatedFlow, ValidationError> {
        if submission.name.trim().is_empty() {
            return Err(ValidationError::MissingFlowName);
        }

        if submission.components.is_empty() {
            return Err(ValidationError::EmptyFlow);
        }

        let len = submission.components.len();
        let components = submission
            .components
            .iter()
            .enumerate()
            .map(|(index, request)| self.validate_invocation(index, request, len, catalog))
            .collect::<Result<Vec<_>, _>>()?;

        let definition = FlowDefinition {
            name: submission.name.clone(),
            components,
            runners: Vec::new(),
        };

        if self.options.require_acyclic_reachable {
            FlowGraph::build(&definition).check_structure()?;
        }

        Ok(ValidatedFlow(definition))
    }

    /// Validate a single invocation and resolve its version
    fn validate_invocation(
        &self,
        index: usize,
        request: &InvocationRequest,
        len: usize,
        catalog: &Catalog,
    ) -> Result<ComponentInvocation, ValidationError> {
        let spec = catalog
            .find(&request.key)
            .ok_or_else(|| ValidationError::UnknownComponent {
                index,
                key: request.key.clone(),
            })?;

        // Exactly one trigger, and it comes first
        if spec.trigger != (index == 0) {
            return Err(ValidationError::InvalidTriggerPlacement { index });
        }

        let arguments = Self::validate_arguments(index, request, spec)?;

        if index == 0 || self.options.connections == ConnectionPolicy::AllInvocations {
            Self::validate_targets(index, &request.connections.targets, len)?;
        }

        Ok(ComponentInvocation {
            key: spec.key.clone(),
            version: spec.version.clone(),
            arguments,
            connections: Connections {
                targets: request.connections.targets.clone(),
            },
        })
    }

    /// Check supplied arguments conform to the component spec, then that every
    /// required argument is present
    fn validate_arguments(
        index: usize,
        request: &InvocationRequest,
        spec: &ComponentSpec,
    ) -> Result<BTreeMap<String, crate::flow::ArgumentValue>, ValidationError> {
        let mut arguments = BTreeMap::new();

        for (key, value) in &request.arguments {
            let declared = spec
                .argument(key)
                .ok_or_else(|| ValidationError::UnknownArgument {
                    index,
                    key: key.clone(),
                })?;

            let value = match value {
                Some(v) if !v.is_empty() => v,
                _ => {
                    return Err(ValidationError::EmptyArgument {
                        index,
                        key: key.clone(),
                    })
                }
            };

            if value.kind() != declared.kind {
                return Err(ValidationError::ArgumentTypeMismatch {
                    index,
                    key: key.clone(),
                    expected: declared.kind,
                    found: value.kind(),
                });
            }

            arguments.insert(key.clone(), value.clone());
        }

        for required in spec.required_arguments() {
            if !request.arguments.contains_key(&required.key) {
                return Err(ValidationError::MissingRequiredArgument {
                    index,
                    key: required.key.clone(),
                });
            }
        }

        Ok(arguments)
    }

    /// Range-check connection targets. The trigger must fan out to at
    /// least one invocation.
    fn validate_targets(index: usize, targets: &[usize], len: usize) -> Result<(), ValidationError> {
        if index == 0 && targets.is_empty() {
            return Err(ValidationError::NoOutgoingConnections { index });
        }

        for &target in targets {
            if target == 0 || target >= len || target == index {
                return Err(ValidationError::InvalidConnectionTarget { index, target });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{ArgumentSpec, ArgumentType};
    use crate::flow::ArgumentValue;

    fn catalog() -> Catalog {
        Catalog::new(vec![
            ComponentSpec::new("webhook", "1.4.0", true)
                .with_argument(ArgumentSpec::new("url", ArgumentType::String, true))
                .with_argument(ArgumentSpec::new("timeout", ArgumentType::Number, false)),
            ComponentSpec::new("notify", "0.3.1", false)
                .with_argument(ArgumentSpec::new("channel", ArgumentType::String, true))
                .with_argument(ArgumentSpec::new("mention", ArgumentType::Bool, false)),
        ])
    }

    fn webhook() -> InvocationRequest {
        InvocationRequest::new("webhook")
            .with_argument("url", "https://x")
            .with_targets([1])
    }

    fn notify() -> InvocationRequest {
        InvocationRequest::new("notify").with_argument("channel", "#ops")
    }

    fn submit(components: Vec<InvocationRequest>) -> Result<ValidatedFlow, ValidationError> {
        FlowValidator::new().validate(&FlowSubmission::new("alerts", components), &catalog())
    }

    #[test]
    fn test_valid_two_step_flow() {
        let flow = submit(vec![webhook(), notify()]).unwrap();
        let definition = flow.definition();

        assert_eq!(flow.name(), "alerts");
        assert_eq!(definition.components.len(), 2);
        assert_eq!(definition.components[0].version, "1.4.0");
        assert_eq!(definition.components[1].version, "0.3.1");
        assert_eq!(definition.components[0].connections.targets, vec![1]);
        assert!(definition.runners.is_empty());
    }

    #[test]
    fn test_missing_required_argument() {
        let trigger = InvocationRequest::new("webhook").with_targets([1]);
        let err = submit(vec![trigger, notify()]).unwrap_err();
        assert_eq!(
            err,
            ValidationError::MissingRequiredArgument {
                index: 0,
                key: "url".into()
            }
        );
    }

    #[test]
    fn test_empty_flow_and_name() {
        assert_eq!(submit(vec![]).unwrap_err(), ValidationError::EmptyFlow);

        let err = FlowValidator::new()
            .validate(&FlowSubmission::new("  ", vec![webhook()]), &catalog())
            .unwrap_err();
        assert_eq!(err, ValidationError::MissingFlowName);
    }

    #[test]
    fn test_unknown_component() {
        let err = submit(vec![webhook(), InvocationRequest::new("pager")]).unwrap_err();
        assert_eq!(
            err,
            ValidationError::UnknownComponent {
                index: 1,
                key: "pager".into()
            }
        );
    }

    #[test]
    fn test_non_trigger_first_fails_regardless_of_content() {
        // Otherwise broken content after index 0 must not matter
        let first = InvocationRequest::new("notify")
            .with_argument("nope", true)
            .with_targets([0, 7]);
        let err = submit(vec![first, InvocationRequest::new("pager")]).unwrap_err();
        assert_eq!(err, ValidationError::InvalidTriggerPlacement { index: 0 });
    }

    #[test]
    fn test_second_trigger_rejected() {
        let err = submit(vec![webhook(), webhook()]).unwrap_err();
        assert_eq!(err, ValidationError::InvalidTriggerPlacement { index: 1 });
    }

    #[test]
    fn test_argument_conformance() {
        let unknown = notify().with_argument("color", "red");
        assert_eq!(
            submit(vec![webhook(), unknown]).unwrap_err(),
            ValidationError::UnknownArgument {
                index: 1,
                key: "color".into()
            }
        );

        let empty = InvocationRequest::new("notify").with_argument("channel", "");
        assert_eq!(
            submit(vec![webhook(), empty]).unwrap_err(),
            ValidationError::EmptyArgument {
                index: 1,
                key: "channel".into()
            }
        );

        let null = InvocationRequest::new("notify").with_null_argument("channel");
        assert!(matches!(
            submit(vec![webhook(), null]).unwrap_err(),
            ValidationError::EmptyArgument { index: 1, .. }
        ));

        // "30" is text, not a number; no coercion
        let mistyped = webhook().with_argument("timeout", "30");
        assert_eq!(
            submit(vec![mistyped, notify()]).unwrap_err(),
            ValidationError::ArgumentTypeMismatch {
                index: 0,
                key: "timeout".into(),
                expected: ArgumentType::Number,
                found: ArgumentType::String,
            }
        );

        let typed = notify().with_argument("mention", true);
        let flow = submit(vec![webhook().with_argument("timeout", 30.0), typed]).unwrap();
        assert_eq!(
            flow.definition().components[1].arguments["mention"],
            ArgumentValue::Bool(true)
        );
    }

    #[test]
    fn test_trigger_needs_outgoing_connections() {
        let trigger = InvocationRequest::new("webhook").with_argument("url", "https://x");
        assert_eq!(
            submit(vec![trigger, notify()]).unwrap_err(),
            ValidationError::NoOutgoingConnections { index: 0 }
        );
    }

    #[test]
    fn test_invalid_connection_targets() {
        for target in [0usize, 2, 5] {
            let trigger = webhook().with_targets([1, target]);
            assert_eq!(
                submit(vec![trigger, notify()]).unwrap_err(),
                ValidationError::InvalidConnectionTarget { index: 0, target },
                "target {} should be rejected",
                target
            );
        }
    }

    #[test]
    fn test_non_trigger_connections_follow_policy() {
        // Self-reference on index 1 is only caught when every invocation is checked
        let looping = notify().with_targets([1]);
        let components = vec![webhook(), looping];
        assert!(submit(components.clone()).is_ok());

        let options = ValidationOptions {
            connections: ConnectionPolicy::AllInvocations,
            require_acyclic_reachable: false,
        };
        let err = FlowValidator::with_options(options)
            .validate(&FlowSubmission::new("alerts", components), &catalog())
            .unwrap_err();
        assert_eq!(
            err,
            ValidationError::InvalidConnectionTarget {
                index: 1,
                target: 1
            }
        );
    }

    #[test]
    fn test_strict_mode_checks_graph_structure() {
        let strict = FlowValidator::with_options(ValidationOptions::strict());

        // 1 -> 2 -> 1 is a cycle the range checks accept
        let cyclic = vec![webhook(), notify().with_targets([2]), notify().with_targets([1])];
        assert!(submit(cyclic.clone()).is_ok());
        assert_eq!(
            strict
                .validate(&FlowSubmission::new("alerts", cyclic), &catalog())
                .unwrap_err(),
            ValidationError::CyclicFlow {
                indices: vec![1, 2]
            }
        );

        // index 2 hangs off nothing
        let orphan = vec![webhook(), notify(), notify()];
        assert_eq!(
            strict
                .validate(&FlowSubmission::new("alerts", orphan), &catalog())
                .unwrap_err(),
            ValidationError::UnreachableComponent { index: 2 }
        );
    }

    #[test]
    fn test_validation_is_deterministic() {
        let components = vec![
            webhook().with_argument("timeout", 10.0),
            notify().with_argument("mention", false),
        ];
        let a = serde_json::to_vec(&submit(components.clone()).unwrap()).unwrap();
        let b = serde_json::to_vec(&submit(components).unwrap()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_client_version_is_ignored() {
        let json = r##"{
            "name": "alerts",
            "components": [
                {"key": "webhook", "version": "0.0.1", "arguments": {"url": "https://x"}, "connections": {"targets": [1]}},
                {"key": "notify", "arguments": {"channel": "#ops"}}
            ]
        }"##;
        let submission = FlowSubmission::from_json(json).unwrap();
        let flow = FlowValidator::new().validate(&submission, &catalog()).unwrap();
        assert_eq!(flow.definition().components[0].version, "1.4.0");
    }
}
