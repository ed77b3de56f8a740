// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 jetflow contributors

//! Validate command - check a flow submission against the catalog

use colored::Colorize;
use miette::Result;
use std::path::Path;

use super::Cli;
use crate::flow::FlowSubmission;

/// Run the validate command
pub async fn run(cli: &Cli, file: &Path) -> Result<()> {
    println!("{}", "Validating flow...".bold());
    println!();

    if !file.exists() {
        return Err(miette::miette!("Flow file not found: {}", file.display()));
    }

    let submission = match FlowSubmission::from_file(file) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("  {} Failed to parse flow submission", "✗".red());
            eprintln!();
            return Err(e.into());
        }
    };

    println!("  {} Flow file is valid JSON", "✓".green());

    let session = cli.open().await?;
    let flow = match session.plane.validate_flow(&submission) {
        Ok(flow) => flow,
        Err(e) => {
            println!("  {} {}", "✗".red(), e);
            println!();
            return Err(e.into());
        }
    };

    println!(
        "  {} {} component(s) match the catalog",
        "✓".green(),
        flow.definition().components.len()
    );

    println!();
    println!("{}:", "Resolved flow".bold());
    let json = serde_json::to_string_pretty(flow.definition())
        .map_err(|e| miette::miette!("Failed to render flow: {}", e))?;
    println!("{}", json);

    println!();
    println!("{}", format!("Flow '{}' is valid!", flow.name()).green().bold());
    Ok(())
}
