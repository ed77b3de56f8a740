// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 jetflow contributors

//! Components command - list the component catalog

use colored::Colorize;
use miette::Result;

use super::Cli;

/// Run the components command
pub async fn run(cli: &Cli) -> Result<()> {
    let session = cli.open().await?;
    let catalog = session.plane.list_components();

    println!("{}", "Component Catalog".bold());
    println!("{}", "═".repeat(40));

    for spec in catalog.iter() {
        let marker = if spec.trigger {
            " [trigger]".cyan().to_string()
        } else {
            String::new()
        };

        println!("  {} {}{}", spec.key.bold(), spec.version.dimmed(), marker);

        if cli.verbose {
            if !spec.description.is_empty() {
                println!("    {}", spec.description);
            }

            for argument in &spec.arguments {
                let required = if argument.required { "required" } else { "optional" };
                println!(
                    "    - {} ({}, {})",
                    argument.key,
                    argument.kind,
                    required.dimmed()
                );
            }
        }
    }

    println!();
    println!("{} component(s)", catalog.len());

    Ok(())
}
