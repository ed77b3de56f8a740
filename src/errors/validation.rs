// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 jetflow contributors

//! Flow validation errors
//!
//! Messages address the offending invocation as `components[i]` so a
//! client can map them straight back onto its submission.

use miette::Diagnostic;
use thiserror::Error;

use crate::component::ArgumentType;

/// First failure found while validating a flow submission
#[derive(Error, Debug, Diagnostic, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Flow name is empty")]
    #[diagnostic(code(jetflow::validation::missing_flow_name))]
    MissingFlowName,

    #[error("Cluster name is empty")]
    #[diagnostic(code(jetflow::validation::missing_cluster_name))]
    MissingClusterName,

    #[error("Flow has no components")]
    #[diagnostic(
        code(jetflow::validation::empty_flow),
        help("A flow needs at least a trigger component at index 0")
    )]
    EmptyFlow,

    #[error("components[{index}].key '{key}' was not found in the component catalog")]
    #[diagnostic(
        code(jetflow::validation::unknown_component),
        help("List available components with 'jetflow components'")
    )]
    UnknownComponent { index: usize, key: String },

    #[error("components[{index}] {}", trigger_placement(.index))]
    #[diagnostic(
        code(jetflow::validation::invalid_trigger_placement),
        help("Exactly one trigger component is allowed and it must come first")
    )]
    InvalidTriggerPlacement { index: usize },

    #[error("components[{index}].arguments '{key}' is not declared by the component")]
    #[diagnostic(code(jetflow::validation::unknown_argument))]
    UnknownArgument { index: usize, key: String },

    #[error("components[{index}].arguments '{key}' is empty")]
    #[diagnostic(code(jetflow::validation::empty_argument))]
    EmptyArgument { index: usize, key: String },

    #[error("components[{index}].arguments '{key}' is not a {expected} (got {found})")]
    #[diagnostic(code(jetflow::validation::argument_type_mismatch))]
    ArgumentTypeMismatch {
        index: usize,
        key: String,
        expected: ArgumentType,
        found: ArgumentType,
    },

    #[error("components[{index}].arguments '{key}' is required")]
    #[diagnostic(code(jetflow::validation::missing_required_argument))]
    MissingRequiredArgument { index: usize, key: String },

    #[error("components[{index}] has no outgoing connections")]
    #[diagnostic(
        code(jetflow::validation::no_outgoing_connections),
        help("The trigger must connect to at least one downstream component")
    )]
    NoOutgoingConnections { index: usize },

    #[error("components[{index}].connections.targets contains invalid target {target}")]
    #[diagnostic(
        code(jetflow::validation::invalid_connection_target),
        help("Targets are indices into the component list; they cannot point at index 0, at the component itself, or past the end")
    )]
    InvalidConnectionTarget { index: usize, target: usize },

    #[error("Flow contains a connection cycle through components {indices:?}")]
    #[diagnostic(code(jetflow::validation::cyclic_flow))]
    CyclicFlow { indices: Vec<usize> },

    #[error("components[{index}] is not reachable from the trigger")]
    #[diagnostic(code(jetflow::validation::unreachable_component))]
    UnreachableComponent { index: usize },

    #[error("Invalid flow submission: {reason}")]
    #[diagnostic(code(jetflow::validation::invalid_submission))]
    InvalidSubmission { reason: String },
}

fn trigger_placement(index: &usize) -> &'static str {
    if *index == 0 {
        "is not a trigger"
    } else {
        "cannot be a trigger"
    }
}

impl ValidationError {
    /// Index of the offending invocation, when the error names one
    pub fn index(&self) -> Option<usize> {
        match self {
            Self::UnknownComponent { index, .. }
            | Self::InvalidTriggerPlacement { index }
            | Self::UnknownArgument { index, .. }
            | Self::EmptyArgument { index, .. }
            | Self::ArgumentTypeMismatch { index, .. }
            | Self::MissingRequiredArgument { index, .. }
            | Self::NoOutgoingConnections { index }
            | Self::InvalidConnectionTarget { index, .. }
            | Self::UnreachableComponent { index } => Some(*index),
            Self::MissingFlowName
            | Self::MissingClusterName
            | Self::EmptyFlow
            | Self::CyclicFlow { .. }
            | Self::InvalidSubmission { .. } => None,
        }
    }
}
