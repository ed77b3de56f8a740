// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 jetflow contributors

//! Settings loading
//!
//! Load control plane settings from `.jetflow.yaml`. Every field has a
//! default, so a missing file means default settings.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::{JetflowError, JetflowResult};
use crate::flow::ValidationOptions;
use crate::store::DEFAULT_CONFLICT_RETRIES;

/// Default settings file name
pub const SETTINGS_FILE: &str = ".jetflow.yaml";

/// Control plane settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Directory holding the flow and cluster documents
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,

    /// Directory scanned for `*-component/spec.yml` descriptors
    #[serde(default = "default_components_dir")]
    pub components_dir: PathBuf,

    /// Runner release stamped into new attachments
    #[serde(default)]
    pub runner_version: String,

    #[serde(default)]
    pub validation: ValidationOptions,

    /// Re-read rounds after a revision conflict
    #[serde(default = "default_conflict_retries")]
    pub max_conflict_retries: usize,

    /// Per-operation deadline; 0 disables it
    #[serde(default = "default_timeout_ms")]
    pub operation_timeout_ms: u64,
}

fn default_components_dir() -> PathBuf {
    PathBuf::from("components")
}

fn default_conflict_retries() -> usize {
    DEFAULT_CONFLICT_RETRIES
}

fn default_timeout_ms() -> u64 {
    30_000
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: None,
            components_dir: default_components_dir(),
            runner_version: String::new(),
            validation: ValidationOptions::default(),
            max_conflict_retries: default_conflict_retries(),
            operation_timeout_ms: default_timeout_ms(),
        }
    }
}

impl Settings {
    /// Parse settings from YAML
    pub fn from_yaml(yaml: &str) -> JetflowResult<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }

        serde_yaml::from_str(yaml).map_err(|e| JetflowError::Config {
            message: format!("failed to parse settings: {}", e),
        })
    }

    /// Load settings from a file
    pub fn from_file(path: &Path) -> JetflowResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| JetflowError::Config {
            message: format!("failed to read '{}': {}", path.display(), e),
        })?;

        Self::from_yaml(&content)
    }

    /// Load an explicit settings file, or `.jetflow.yaml` from the current
    /// directory when present
    pub fn load(explicit: Option<&Path>) -> JetflowResult<Self> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => {
                let path = Path::new(SETTINGS_FILE);
                if path.exists() {
                    Self::from_file(path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Data directory, falling back to the platform data directory
    pub fn resolve_data_dir(&self) -> PathBuf {
        if let Some(dir) = &self.data_dir {
            return dir.clone();
        }

        directories::ProjectDirs::from("", "", "jetflow")
            .map(|dirs| dirs.data_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from(".jetflow"))
    }

    pub fn operation_timeout(&self) -> Option<Duration> {
        (self.operation_timeout_ms > 0).then(|| Duration::from_millis(self.operation_timeout_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::ConnectionPolicy;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let settings = Settings::from_yaml("").unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.max_conflict_retries, 3);
        assert_eq!(settings.operation_timeout(), Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_parse_settings() {
        let yaml = r#"
data_dir: /var/lib/jetflow
components_dir: ./catalog
runner_version: v2.1.0
validation:
  connections: all-invocations
  require_acyclic_reachable: true
max_conflict_retries: 5
operation_timeout_ms: 0
"#;

        let settings = Settings::from_yaml(yaml).unwrap();
        assert_eq!(settings.resolve_data_dir(), PathBuf::from("/var/lib/jetflow"));
        assert_eq!(settings.components_dir, PathBuf::from("./catalog"));
        assert_eq!(settings.validation.connections, ConnectionPolicy::AllInvocations);
        assert!(settings.validation.require_acyclic_reachable);
        assert_eq!(settings.max_conflict_retries, 5);
        assert_eq!(settings.operation_timeout(), None);
    }

    #[test]
    fn test_invalid_settings() {
        let err = Settings::from_yaml("validation:\n  connections: sometimes\n").unwrap_err();
        assert!(matches!(err, JetflowError::Config { .. }));
    }

    #[test]
    fn test_load_explicit_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("custom.yaml");
        std::fs::write(&path, "runner_version: 1.0.0\n").unwrap();

        let settings = Settings::load(Some(&path)).unwrap();
        assert_eq!(settings.runner_version, "1.0.0");

        assert!(Settings::load(Some(&temp_dir.path().join("missing.yaml"))).is_err());
    }
}
