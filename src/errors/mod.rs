// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 jetflow contributors

//! Error types
//!
//! Every failure the control plane can produce is a [`JetflowError`].
//! Client-caused failures carry the offending index or field so they can
//! be shown verbatim; infrastructure failures carry context for the logs
//! but are reported to clients through [`JetflowError::public_message`].

mod validation;

pub use validation::ValidationError;

use miette::Diagnostic;
use thiserror::Error;

/// Result type for jetflow operations
pub type JetflowResult<T> = Result<T, JetflowError>;

/// Broad classification of an error, used at the boundary to pick a
/// response (e.g. an HTTP status or a CLI exit code).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The submitted data is invalid (4xx)
    Validation,
    /// The write collides with existing state
    Conflict,
    /// A referenced item does not exist
    NotFound,
    /// Backing store or collaborator failure
    Infrastructure,
    /// The caller cancelled or the deadline elapsed
    Cancelled,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation => write!(f, "validation"),
            Self::Conflict => write!(f, "conflict"),
            Self::NotFound => write!(f, "not-found"),
            Self::Infrastructure => write!(f, "infrastructure"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Main error type for jetflow
#[derive(Error, Debug, Diagnostic)]
pub enum JetflowError {
    // ─────────────────────────────────────────────────────────────────────────
    // Validation Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error(transparent)]
    #[diagnostic(transparent)]
    Validation(#[from] ValidationError),

    // ─────────────────────────────────────────────────────────────────────────
    // Conflict Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Item '{name}' already exists in '{document}'")]
    #[diagnostic(code(jetflow::item_already_exists))]
    ItemAlreadyExists { document: String, name: String },

    #[error("Document '{document}' kept changing underneath the write ({attempts} attempts)")]
    #[diagnostic(
        code(jetflow::revision_conflict),
        help("Another writer is updating the same document; try again")
    )]
    RevisionConflict { document: String, attempts: usize },

    #[error("Runner already exists for flow '{flow}' on cluster '{cluster}'")]
    #[diagnostic(
        code(jetflow::runner_already_attached),
        help("A flow can be attached to each cluster only once")
    )]
    RunnerAlreadyAttached { flow: String, cluster: String },

    #[error("Namespace '{namespace}' already exists in cluster '{cluster}'")]
    #[diagnostic(code(jetflow::namespace_already_exists))]
    NamespaceAlreadyExists { cluster: String, namespace: String },

    // ─────────────────────────────────────────────────────────────────────────
    // Not Found Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("{}", key_not_found(.document, .name))]
    #[diagnostic(code(jetflow::key_not_found))]
    KeyNotFound {
        document: String,
        /// `None` when the whole document is absent or empty
        name: Option<String>,
    },

    #[error("Flow '{name}' not found")]
    #[diagnostic(
        code(jetflow::flow_not_found),
        help("List stored flows with 'jetflow flow list'")
    )]
    FlowNotFound { name: String },

    #[error("Cluster '{name}' not found")]
    #[diagnostic(
        code(jetflow::cluster_not_found),
        help("Register the cluster first with 'jetflow cluster add'")
    )]
    ClusterNotFound { name: String },

    #[error("Namespace '{namespace}' does not exist in cluster '{cluster}'")]
    #[diagnostic(code(jetflow::namespace_not_found))]
    NamespaceNotFound { cluster: String, namespace: String },

    // ─────────────────────────────────────────────────────────────────────────
    // Infrastructure Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Backing store error: {message}")]
    #[diagnostic(code(jetflow::store_error))]
    Store { message: String },

    #[error("Component catalog error: {message}")]
    #[diagnostic(code(jetflow::catalog_error))]
    Catalog {
        message: String,
        #[help]
        help: Option<String>,
    },

    #[error("Collaborator '{collaborator}' failed: {message}")]
    #[diagnostic(code(jetflow::collaborator_error))]
    Collaborator {
        collaborator: String,
        message: String,
    },

    #[error("Invalid configuration: {message}")]
    #[diagnostic(code(jetflow::config_error))]
    Config { message: String },

    #[error("IO error: {message}")]
    #[diagnostic(code(jetflow::io_error))]
    Io { message: String },

    #[error("JSON error: {message}")]
    #[diagnostic(code(jetflow::json_error))]
    Json { message: String },

    #[error("YAML error: {message}")]
    #[diagnostic(code(jetflow::yaml_error))]
    Yaml { message: String },

    // ─────────────────────────────────────────────────────────────────────────
    // Cancellation
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Operation cancelled")]
    #[diagnostic(code(jetflow::cancelled))]
    Cancelled,

    #[error("Operation deadline exceeded")]
    #[diagnostic(code(jetflow::deadline_exceeded))]
    DeadlineExceeded,
}

fn key_not_found(document: &str, name: &Option<String>) -> String {
    match name {
        Some(name) => format!("Key '{}' not found in '{}'", name, document),
        None => format!("No items found in '{}'", document),
    }
}

impl From<std::io::Error> for JetflowError {
    fn from(e: std::io::Error) -> Self {
        Self::Io { message: e.to_string() }
    }
}

impl From<serde_yaml::Error> for JetflowError {
    fn from(e: serde_yaml::Error) -> Self {
        Self::Yaml { message: e.to_string() }
    }
}

impl From<serde_json::Error> for JetflowError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json { message: e.to_string() }
    }
}

impl JetflowError {
    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::ItemAlreadyExists { .. }
            | Self::RevisionConflict { .. }
            | Self::RunnerAlreadyAttached { .. }
            | Self::NamespaceAlreadyExists { .. } => ErrorKind::Conflict,
            Self::KeyNotFound { .. }
            | Self::FlowNotFound { .. }
            | Self::ClusterNotFound { .. }
            | Self::NamespaceNotFound { .. } => ErrorKind::NotFound,
            Self::Store { .. }
            | Self::Catalog { .. }
            | Self::Collaborator { .. }
            | Self::Config { .. }
            | Self::Io { .. }
            | Self::Json { .. }
            | Self::Yaml { .. } => ErrorKind::Infrastructure,
            Self::Cancelled | Self::DeadlineExceeded => ErrorKind::Cancelled,
        }
    }

    /// True for the repository-level "no such key" error
    pub fn is_key_not_found(&self) -> bool {
        matches!(self, Self::KeyNotFound { .. })
    }

    /// Message safe to hand back to a client.
    ///
    /// Infrastructure failures are collapsed into a generic message so
    /// backing-store details never leak; everything else is already
    /// phrased for the user.
    pub fn public_message(&self) -> String {
        match self.kind() {
            ErrorKind::Infrastructure => "an internal error occurred".to_string(),
            _ => self.to_string(),
        }
    }

    /// Wrap a backing-store failure with context
    pub fn store(context: &str, error: impl std::fmt::Display) -> Self {
        Self::Store {
            message: format!("{}: {}", context, error),
        }
    }

    /// Create a catalog error without a help line
    pub fn catalog(message: impl Into<String>) -> Self {
        Self::Catalog {
            message: message.into(),
            help: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds() {
        let err: JetflowError = ValidationError::EmptyFlow.into();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let err = JetflowError::RunnerAlreadyAttached {
            flow: "f".into(),
            cluster: "c".into(),
        };
        assert_eq!(err.kind(), ErrorKind::Conflict);

        assert_eq!(
            JetflowError::FlowNotFound { name: "f".into() }.kind(),
            ErrorKind::NotFound
        );
        assert_eq!(JetflowError::Cancelled.kind(), ErrorKind::Cancelled);
    }

    #[test]
    fn test_public_message_hides_infrastructure_details() {
        let err = JetflowError::store("write flows", "disk quota exceeded on /var/lib");
        assert_eq!(err.public_message(), "an internal error occurred");
        assert!(err.to_string().contains("disk quota"));

        let err = JetflowError::ClusterNotFound {
            name: "prod".into(),
        };
        assert_eq!(err.public_message(), "Cluster 'prod' not found");
    }
}
