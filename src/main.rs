// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 jetflow contributors

//! jetflow - control plane for component flows
//!
//! Compose catalog components into validated flows, store them and attach
//! them to cluster namespaces.

use clap::Parser;
use miette::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use jetflow::cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "jetflow=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let cli = Cli::parse();

    // Dispatch to command handlers
    let result = match &cli.command {
        Commands::Components => jetflow::cli::components::run(&cli).await,
        Commands::Validate { file } => jetflow::cli::validate::run(&cli, file).await,
        Commands::Flow { action } => jetflow::cli::flow::run(&cli, action).await,
        Commands::Cluster { action } => jetflow::cli::cluster::run(&cli, action).await,
        Commands::Health => jetflow::cli::health::run(&cli).await,
    };

    result.map_err(jetflow::cli::public_report)
}
