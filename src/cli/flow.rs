// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 jetflow contributors

//! Flow command - store, inspect and attach flows

use colored::Colorize;
use miette::Result;

use super::{Cli, FlowAction, GraphFormat};
use crate::flow::{FlowDefinition, FlowGraph, FlowSubmission};

/// Run the flow command
pub async fn run(cli: &Cli, action: &FlowAction) -> Result<()> {
    let session = cli.open().await?;
    let ctx = session.context();
    let plane = &session.plane;

    match action {
        FlowAction::Add { file } => {
            let submission = FlowSubmission::from_file(file)?;
            let flow = plane.submit_flow(&ctx, &submission).await?;

            println!(
                "  {} Flow '{}' stored ({} component(s))",
                "✓".green(),
                flow.name,
                flow.components.len()
            );
            Ok(())
        }

        FlowAction::List => {
            let flows = plane.list_flows(&ctx).await?;

            if flows.is_empty() {
                println!("{}", "No flows stored.".dimmed());
                return Ok(());
            }

            for flow in &flows {
                print_summary(flow);
            }
            Ok(())
        }

        FlowAction::Show { name } => {
            let flow = plane.get_flow(&ctx, name).await?;
            let json = serde_json::to_string_pretty(&flow)
                .map_err(|e| miette::miette!("Failed to render flow: {}", e))?;
            println!("{}", json);
            Ok(())
        }

        FlowAction::Graph { name, format } => {
            let flow = plane.get_flow(&ctx, name).await?;
            let graph = FlowGraph::build(&flow);

            let output = match format {
                GraphFormat::Text => graph.to_text()?,
                GraphFormat::Dot => graph.to_dot(),
                GraphFormat::Mermaid => graph.to_mermaid(),
            };

            print!("{}", output);
            Ok(())
        }

        FlowAction::Attach {
            name,
            cluster,
            namespace,
        } => {
            let flow = plane.attach_runner(&ctx, name, cluster, namespace).await?;
            let version = flow
                .runner_for(cluster)
                .map(|r| r.version.as_str())
                .unwrap_or_default();

            println!(
                "  {} Flow '{}' attached to {}/{} {}",
                "✓".green(),
                name,
                cluster,
                namespace,
                if version.is_empty() {
                    String::new()
                } else {
                    format!("(runner {})", version).dimmed().to_string()
                }
            );
            Ok(())
        }
    }
}

fn print_summary(flow: &FlowDefinition) {
    let trigger = flow.trigger().map(|c| c.key.as_str()).unwrap_or("-");
    println!(
        "  {} {} component(s), trigger {}",
        flow.name.bold(),
        flow.components.len(),
        trigger.cyan()
    );

    for runner in &flow.runners {
        println!(
            "    - {}/{} {}",
            runner.cluster,
            runner.namespace,
            runner.version.dimmed()
        );
    }
}
