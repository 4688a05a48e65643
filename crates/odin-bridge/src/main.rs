//! odin-bridge - expose an odin control server as a tree of pollable
//! attributes.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod cli;
mod commands;
mod config;
mod error;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::from_default_env()
                .add_directive("odin_bridge=info".parse()?)
                .add_directive("odin_core=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    // Load configuration
    let config = config::Config::load(cli.config.as_deref())?.with_overrides(cli.host, cli.port);

    // Execute command
    match cli.command {
        Commands::Tree => commands::tree::execute(&config).await,
        Commands::Put { attribute, value } => {
            commands::put::execute(&attribute, &value, &config).await
        }
        Commands::Run(args) => commands::run::execute(args, &config).await,
    }
}
