// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 jetflow contributors

//! Clusters and namespace discovery
//!
//! A [`Cluster`] is a named connection bundle registered by an operator.
//! Which namespaces exist inside a cluster is answered by a
//! [`NamespaceLookup`] collaborator.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use crate::errors::{JetflowError, JetflowResult};

/// File name of the local namespace registry
pub const NAMESPACES_FILE: &str = "namespaces.yaml";

/// A registered compute cluster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
    pub name: String,

    /// Opaque connection configuration
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub config: serde_json::Value,
}

impl Cluster {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            config: serde_json::Value::Null,
        }
    }

    pub fn with_config(mut self, config: serde_json::Value) -> Self {
        self.config = config;
        self
    }
}

/// Trait for namespace discovery
#[async_trait]
pub trait NamespaceLookup: Send + Sync {
    /// Namespaces currently present in the cluster
    async fn list_namespaces(&self, cluster: &Cluster) -> JetflowResult<Vec<String>>;
}

/// Fixed namespace table
#[derive(Debug, Clone, Default)]
pub struct StaticNamespaces {
    namespaces: HashMap<String, Vec<String>>,
}

impl StaticNamespaces {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cluster<I, S>(mut self, cluster: impl Into<String>, namespaces: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.namespaces.insert(
            cluster.into(),
            namespaces.into_iter().map(Into::into).collect(),
        );
        self
    }
}

#[async_trait]
impl NamespaceLookup for StaticNamespaces {
    async fn list_namespaces(&self, cluster: &Cluster) -> JetflowResult<Vec<String>> {
        Ok(self.namespaces.get(&cluster.name).cloned().unwrap_or_default())
    }
}

/// Namespace registry kept in a YAML file mapping cluster name to
/// namespace list:
///
/// ```yaml
/// prod:
///   - default
///   - ops
/// ```
#[derive(Debug, Clone)]
pub struct FileNamespaces {
    path: PathBuf,
}

impl FileNamespaces {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Registry stored next to the flow documents
    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(NAMESPACES_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> JetflowResult<BTreeMap<String, Vec<String>>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) if content.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(content) => serde_yaml::from_str(&content).map_err(|e| JetflowError::Collaborator {
                collaborator: "namespaces".into(),
                message: format!("failed to parse '{}': {}", self.path.display(), e),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(JetflowError::Collaborator {
                collaborator: "namespaces".into(),
                message: format!("failed to read '{}': {}", self.path.display(), e),
            }),
        }
    }

    /// Register a namespace under a cluster
    pub async fn add_namespace(&self, cluster: &str, namespace: &str) -> JetflowResult<()> {
        let mut registry = self.load().await?;
        let namespaces = registry.entry(cluster.to_string()).or_default();

        if namespaces.iter().any(|n| n == namespace) {
            return Err(JetflowError::NamespaceAlreadyExists {
                cluster: cluster.to_string(),
                namespace: namespace.to_string(),
            });
        }
        namespaces.push(namespace.to_string());

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let content = serde_yaml::to_string(&registry)?;
        tokio::fs::write(&self.path, content).await?;

        tracing::info!(cluster, namespace, "Namespace registered");
        Ok(())
    }
}

#[async_trait]
impl NamespaceLookup for FileNamespaces {
    async fn list_namespaces(&self, cluster: &Cluster) -> JetflowResult<Vec<String>> {
        Ok(self.load().await?.remove(&cluster.name).unwrap_or_default())
    }
}
