//! Beaver Core - Entry Point
//!
//! Loads the configuration, boots the core manifest against the configured
//! GraphQL endpoint and prints what the server reported.

use beaver::RunOptions;
use clap::Parser;

/// Command line interface for Beaver Core
#[derive(Parser, Debug)]
#[command(name = "beaver")]
#[command(about = "Beaver Core - CloudBeaver client bootstrap")]
#[command(version)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    pub config: Option<std::path::PathBuf>,

    /// GraphQL endpoint, overrides `api.endpoint`
    #[arg(short, long)]
    pub endpoint: Option<String>,

    /// Print the drivers known to the server
    #[arg(long)]
    pub drivers: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    beaver::run(RunOptions {
        config_path: cli.config.as_deref(),
        endpoint: cli.endpoint,
        list_drivers: cli.drivers,
    })
    .await
}
