// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 jetflow contributors

//! CLI command definitions and handlers
//!
//! Defines the command-line interface for jetflow.

pub mod cluster;
pub mod components;
pub mod flow;
pub mod health;
pub mod validate;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;

use crate::cluster::FileNamespaces;
use crate::component::DirectoryCatalog;
use crate::config::Settings;
use crate::context::RequestContext;
use crate::control::ControlPlane;
use crate::errors::{ErrorKind, JetflowError};
use crate::flow::FlowValidator;
use crate::store::FilesystemStore;

/// Control plane for component flows
#[derive(Parser, Debug)]
#[clap(
    name = "jetflow",
    version,
    about = "Compose catalog components into validated flows and attach them to clusters",
    long_about = None,
    after_help = "Examples:\n\
        jetflow components                      List the component catalog\n\
        jetflow validate flow.json              Validate a flow without storing it\n\
        jetflow flow add flow.json              Validate and store a flow\n\
        jetflow flow attach alerts --cluster prod --namespace ops\n\n\
        See 'jetflow <command> --help' for more information on a specific command."
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[clap(short, long, global = true)]
    pub verbose: bool,

    /// Settings file (defaults to .jetflow.yaml when present)
    #[clap(long, global = true, value_name = "FILE", env = "JETFLOW_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory holding stored flows and clusters
    #[clap(long, global = true, value_name = "DIR", env = "JETFLOW_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Directory scanned for *-component/spec.yml descriptors
    #[clap(long, global = true, value_name = "DIR", env = "JETFLOW_COMPONENTS_DIR")]
    pub components_dir: Option<PathBuf>,

    /// Runner release stamped into new attachments
    #[clap(long, global = true, value_name = "VERSION", env = "JETFLOW_RUNNER_VERSION")]
    pub runner_version: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the component catalog
    Components,

    /// Validate a flow submission without storing it
    Validate {
        /// JSON flow submission
        file: PathBuf,
    },

    /// Manage stored flows
    Flow {
        #[clap(subcommand)]
        action: FlowAction,
    },

    /// Manage registered clusters
    Cluster {
        #[clap(subcommand)]
        action: ClusterAction,
    },

    /// Check the backing store is reachable
    Health,
}

/// Flow actions
#[derive(Subcommand, Debug, Clone)]
pub enum FlowAction {
    /// Validate and store a flow
    Add {
        /// JSON flow submission
        file: PathBuf,
    },

    /// List stored flows
    List,

    /// Show a stored flow
    Show { name: String },

    /// Show a stored flow as a graph
    Graph {
        name: String,

        /// Output format
        #[clap(short, long, value_enum, default_value = "text")]
        format: GraphFormat,
    },

    /// Attach a stored flow to a cluster namespace
    Attach {
        name: String,

        #[clap(long)]
        cluster: String,

        #[clap(long)]
        namespace: String,
    },
}

/// Cluster actions
#[derive(Subcommand, Debug, Clone)]
pub enum ClusterAction {
    /// Register a cluster
    Add {
        name: String,

        /// YAML or JSON connection bundle
        #[clap(long, value_name = "FILE")]
        connection: Option<PathBuf>,
    },

    /// List registered clusters
    List,

    /// List the namespaces of a cluster
    Namespaces { name: String },

    /// Register a namespace in the local namespace registry
    AddNamespace { name: String, namespace: String },
}

/// Graph output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum GraphFormat {
    Text,
    Dot,
    Mermaid,
}

/// Everything a command needs, wired from settings and flags
pub struct Session {
    pub settings: Settings,
    pub plane: ControlPlane,
    pub namespaces: Arc<FileNamespaces>,
}

impl Session {
    /// Request context for one command: settings deadline plus Ctrl-C
    pub fn context(&self) -> RequestContext {
        let ctx = match self.settings.operation_timeout() {
            Some(timeout) => RequestContext::background().with_timeout(timeout),
            None => RequestContext::background(),
        };

        let (ctx, handle) = ctx.with_cancel();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                handle.cancel();
            }
        });

        ctx
    }
}

impl Cli {
    /// Settings file merged with command-line and environment overrides
    pub fn settings(&self) -> miette::Result<Settings> {
        let mut settings = Settings::load(self.config.as_deref())?;

        if let Some(dir) = &self.data_dir {
            settings.data_dir = Some(dir.clone());
        }
        if let Some(dir) = &self.components_dir {
            settings.components_dir = dir.clone();
        }
        if let Some(version) = &self.runner_version {
            settings.runner_version = version.clone();
        }

        Ok(settings)
    }

    /// Open the local store, load the catalog and build the control plane
    pub async fn open(&self) -> miette::Result<Session> {
        let settings = self.settings()?;
        let data_dir = settings.resolve_data_dir();

        tracing::debug!(
            data_dir = %data_dir.display(),
            components_dir = %settings.components_dir.display(),
            "Opening control plane"
        );

        let store = Arc::new(FilesystemStore::new(data_dir.clone())?);
        let namespaces = Arc::new(FileNamespaces::in_dir(&data_dir));
        let source = DirectoryCatalog::new(settings.components_dir.clone());

        let plane = ControlPlane::load(store, namespaces.clone(), &source)
            .await?
            .with_validator(FlowValidator::with_options(settings.validation))
            .with_runner_version(&settings.runner_version)
            .with_max_conflict_retries(settings.max_conflict_retries);

        Ok(Session {
            settings,
            plane,
            namespaces,
        })
    }
}

/// Error shown for a failed command.
///
/// Infrastructure failures are logged in full and reported through their
/// public message; everything else is shown as is.
pub fn public_report(report: miette::Report) -> miette::Report {
    match report.downcast_ref::<JetflowError>() {
        Some(error) if error.kind() == ErrorKind::Infrastructure => {
            tracing::error!("{}", error);
            miette::miette!("{}", error.public_message())
        }
        _ => report,
    }
}
