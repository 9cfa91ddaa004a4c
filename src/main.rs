//! Pool Guard - screen a liquidity pool before trading it

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::error;

use pool_guard::cli::commands;
use pool_guard::config::Config;

/// Pool Guard - liquidity pool admission checks
#[derive(Parser)]
#[command(name = "pool-guard")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the enabled filters against a pool
    Check {
        /// Raydium v4 pool (AMM) account address
        pool_id: String,

        /// Re-evaluate until enough consecutive matches or the watch window ends
        #[arg(long)]
        watch: bool,

        /// Print the full report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show current configuration (secrets masked)
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("pool_guard=info".parse()?),
        )
        .with_target(true)
        .with_line_number(true)
        .init();

    let cli = Cli::parse();

    let config = match Config::load(&cli.config) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Failed to load configuration: {:#}", e);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Check {
            pool_id,
            watch,
            json,
        } => commands::check(&config, &pool_id, watch, json).await,
        Commands::Config => commands::show_config(&config).map(|_| true),
    };

    match result {
        Ok(true) => Ok(()),
        Ok(false) => std::process::exit(1),
        Err(e) => {
            error!("Command failed: {:#}", e);
            std::process::exit(1);
        }
    }
}
