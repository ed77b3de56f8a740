// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 jetflow contributors

//! Flow definitions and validation
//!
//! This module defines the flow graph model (component invocations and
//! their connections), the validator that turns a client submission into
//! a persistable flow, and a graph view for structural checks.

mod dag;
mod definition;
mod validation;

pub use dag::FlowGraph;
pub use definition::*;
pub use validation::{ConnectionPolicy, FlowValidator, ValidatedFlow, ValidationOptions};
