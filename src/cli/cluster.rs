// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 jetflow contributors

//! Cluster command - register clusters and their namespaces

use colored::Colorize;
use miette::Result;
use std::path::Path;

use super::{ClusterAction, Cli};
use crate::cluster::Cluster;

/// Run the cluster command
pub async fn run(cli: &Cli, action: &ClusterAction) -> Result<()> {
    let session = cli.open().await?;
    let ctx = session.context();
    let plane = &session.plane;

    match action {
        ClusterAction::Add { name, connection } => {
            let mut cluster = Cluster::new(name.clone());
            if let Some(path) = connection {
                cluster = cluster.with_config(read_connection(path)?);
            }

            plane.add_cluster(&ctx, cluster).await?;
            println!("  {} Cluster '{}' registered", "✓".green(), name);
            Ok(())
        }

        ClusterAction::List => {
            let clusters = plane.list_clusters(&ctx).await?;

            if clusters.is_empty() {
                println!("{}", "No clusters registered.".dimmed());
                return Ok(());
            }

            for cluster in &clusters {
                println!("  • {}", cluster.name);
            }
            Ok(())
        }

        ClusterAction::Namespaces { name } => {
            let namespaces = plane.list_cluster_namespaces(&ctx, name).await?;

            if namespaces.is_empty() {
                println!("{}", format!("No namespaces known for '{}'.", name).dimmed());
                return Ok(());
            }

            for namespace in &namespaces {
                println!("  • {}", namespace);
            }
            Ok(())
        }

        ClusterAction::AddNamespace { name, namespace } => {
            // Namespaces can only be added to clusters that exist
            plane.get_cluster(&ctx, name).await?;
            session.namespaces.add_namespace(name, namespace).await?;

            println!(
                "  {} Namespace '{}' added to cluster '{}'",
                "✓".green(),
                namespace,
                name
            );
            Ok(())
        }
    }
}

/// Connection bundles are YAML, which also accepts plain JSON
fn read_connection(path: &Path) -> Result<serde_json::Value> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        miette::miette!("Failed to read connection file '{}': {}", path.display(), e)
    })?;

    serde_yaml::from_str(&content).map_err(|e| {
        miette::miette!("Failed to parse connection file '{}': {}", path.display(), e)
    })
}
