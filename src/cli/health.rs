// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 jetflow contributors

//! Health command - ping the backing store

use colored::Colorize;
use miette::Result;

use super::Cli;

/// Run the health command
pub async fn run(cli: &Cli) -> Result<()> {
    let session = cli.open().await?;
    let ctx = session.context();

    session.plane.health(&ctx).await?;

    println!(
        "  {} Backing store reachable at {}",
        "✓".green(),
        session.settings.resolve_data_dir().display()
    );
    println!(
        "  {} {} component(s) in catalog",
        "✓".green(),
        session.plane.list_components().len()
    );

    Ok(())
}
