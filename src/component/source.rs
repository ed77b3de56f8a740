// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 jetflow contributors

//! Component sources
//!
//! Where component specs come from. The directory source mirrors the
//! layout of a component organization: one `<name>-component` folder per
//! component, each holding a `spec.yml` descriptor.

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use super::{ComponentDescriptor, ComponentSpec};
use crate::errors::{JetflowError, JetflowResult};

/// Supplier of component specs
#[async_trait]
pub trait ComponentSource: Send + Sync {
    /// List every component spec the source publishes
    async fn list_component_specs(&self) -> JetflowResult<Vec<ComponentSpec>>;
}

/// Fixed, in-memory list of specs
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    specs: Vec<ComponentSpec>,
}

impl StaticCatalog {
    pub fn new(specs: Vec<ComponentSpec>) -> Self {
        Self { specs }
    }
}

#[async_trait]
impl ComponentSource for StaticCatalog {
    async fn list_component_specs(&self) -> JetflowResult<Vec<ComponentSpec>> {
        Ok(self.specs.clone())
    }
}

/// Scans `<root>/*-component/spec.yml`
#[derive(Debug, Clone)]
pub struct DirectoryCatalog {
    root: PathBuf,
}

/// Folder suffix that marks a component repository
const COMPONENT_SUFFIX: &str = "-component";

/// Descriptor file name inside a component repository
const DESCRIPTOR_FILE: &str = "spec.yml";

impl DirectoryCatalog {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Component folders in lexical order
    fn component_dirs(&self) -> JetflowResult<Vec<PathBuf>> {
        let pattern = self
            .root
            .join(format!("*{}", COMPONENT_SUFFIX))
            .to_string_lossy()
            .to_string();

        let dirs = glob::glob(&pattern)
            .map_err(|e| JetflowError::catalog(format!("invalid catalog path: {}", e)))?
            .filter_map(Result::ok)
            .filter(|p| p.is_dir())
            .collect();

        Ok(dirs)
    }

    async fn read_spec(dir: &Path) -> JetflowResult<ComponentSpec> {
        let repo = dir
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let path = dir.join(DESCRIPTOR_FILE);

        let content = tokio::fs::read_to_string(&path).await.map_err(|e| {
            JetflowError::catalog(format!(
                "failed to read '{}' component spec file: {}",
                repo, e
            ))
        })?;

        let descriptor = ComponentDescriptor::from_yaml(&content).map_err(|e| {
            JetflowError::catalog(format!(
                "failed to decode '{}' component spec file: {}",
                repo, e
            ))
        })?;

        descriptor.into_spec().map_err(|reason| JetflowError::Catalog {
            message: format!("failed to validate '{}' component spec file: {}", repo, reason),
            help: Some(format!("Fix {}", path.display())),
        })
    }
}

#[async_trait]
impl ComponentSource for DirectoryCatalog {
    async fn list_component_specs(&self) -> JetflowResult<Vec<ComponentSpec>> {
        let dirs = self.component_dirs()?;

        if dirs.is_empty() {
            return Err(JetflowError::Catalog {
                message: format!(
                    "could not find a component repository in '{}'",
                    self.root.display()
                ),
                help: Some(format!(
                    "Component folders must end in '{}' and contain a {}",
                    COMPONENT_SUFFIX, DESCRIPTOR_FILE
                )),
            });
        }

        let mut specs = Vec::with_capacity(dirs.len());
        for dir in dirs {
            let spec = Self::read_spec(&dir).await?;
            tracing::debug!(key = %spec.key, version = %spec.version, "loaded component spec");
            specs.push(spec);
        }

        Ok(specs)
    }
}
