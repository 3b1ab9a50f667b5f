//! Leadrank CLI entry point

use clap::Parser;
use leadrank::cli::{Cli, Commands};
use leadrank::core::error::Result;
use leadrank::Config;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_env("LEADRANK_LOG"))
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    match cli.command {
        Commands::Explain(args) => leadrank::cli::explain::run(args, &config),
        Commands::Score(args) => leadrank::cli::score::run(args, &config).await,
        Commands::Config => leadrank::cli::config::run(&config),
    }
}
