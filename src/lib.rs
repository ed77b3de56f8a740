// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 jetflow contributors

//! # jetflow - Control plane for component flows
//!
//! `jetflow` lets operators compose reusable components into named flows,
//! validates them against a component catalog and stores them in a
//! versioned document store.
//!
//! ## Features
//!
//! - **Component catalog** - Typed argument schemas loaded from `spec.yml` descriptors
//! - **Flow validation** - Trigger placement, argument types and connection checks
//! - **Versioned storage** - Revision-conditional writes that never lose updates
//! - **Runner attachment** - Record which cluster namespace a flow runs in
//!
//! ## Quick Start
//!
//! ```bash
//! # List available components
//! jetflow components
//!
//! # Validate and store a flow
//! jetflow flow add alerts.json
//!
//! # Attach it to a cluster namespace
//! jetflow flow attach alerts --cluster prod --namespace ops
//! ```

pub mod cli;
pub mod cluster;
pub mod component;
pub mod config;
pub mod context;
pub mod control;
pub mod errors;
pub mod flow;
pub mod store;

// Re-export commonly used types
pub use cluster::{Cluster, NamespaceLookup};
pub use component::{Catalog, ComponentSource, ComponentSpec};
pub use context::RequestContext;
pub use control::ControlPlane;
pub use errors::{ErrorKind, JetflowError, JetflowResult, ValidationError};
pub use flow::{FlowDefinition, FlowSubmission, FlowValidator, ValidatedFlow};
pub use store::{DocumentStore, Repository};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
