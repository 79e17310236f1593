use anyhow::Result;
use clap::{Parser, Subcommand};
use cot_core::{AppConfig, ConfigLoader};
use std::path::PathBuf;

mod commands;
mod pipeline;

use commands::{BuildAllArgs, FetchArgs, ListMarketsArgs, NormalizeArgs, ScreenArgs};

#[derive(Parser)]
#[command(name = "cot")]
#[command(about = "CFTC Commitments of Traders positioning pipeline", long_about = None)]
struct Cli {
    /// Config file path
    #[arg(short, long, global = true, default_value = "config/Config.toml")]
    config: PathBuf,

    /// Config profile; layers config/Config.{profile}.toml over config/Config.toml
    #[arg(long, global = true, env = "COT_PROFILE")]
    profile: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the market names a report program publishes
    ListMarkets(ListMarketsArgs),
    /// Download a report program's universe into the raw table
    Fetch(FetchArgs),
    /// Normalize a raw table into a tidy panel
    Normalize(NormalizeArgs),
    /// Combine tidy panels and attach asset classes
    BuildTidy,
    /// Compute metrics and the latest snapshot
    Metrics,
    /// Fetch, normalize, combine and compute in one run
    BuildAll(BuildAllArgs),
    /// Print a sector's snapshot scores, changes and flags
    Screen(ScreenArgs),
}

fn load_config(cli: &Cli) -> Result<AppConfig> {
    match &cli.profile {
        Some(profile) => ConfigLoader::load_with_profile(profile),
        None => ConfigLoader::load_from(&cli.config),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = load_config(&cli)?;
    tracing::debug!(data_dir = %config.storage.data_dir.display(), "Loaded configuration");

    match cli.command {
        Commands::ListMarkets(args) => commands::run_list_markets(args, &config).await?,
        Commands::Fetch(args) => commands::run_fetch(args, &config).await?,
        Commands::Normalize(args) => commands::run_normalize(args, &config)?,
        Commands::BuildTidy => commands::run_build_tidy(&config)?,
        Commands::Metrics => commands::run_metrics(&config)?,
        Commands::BuildAll(args) => commands::run_build_all(args, &config).await?,
        Commands::Screen(args) => commands::run_screen(args, &config)?,
    }

    Ok(())
}
