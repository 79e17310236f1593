//! List-markets CLI command.
//!
//! Prints the distinct `market_and_exchange_names` values a report program
//! currently publishes, optionally narrowed to one asset class.

use anyhow::Result;
use clap::Args;
use cot_cftc::SodaClient;
use cot_core::AppConfig;
use cot_data::{AssetClass, MarketTaxonomy, NameCatalog, SourceProgram};

use crate::pipeline::source_url;

/// Arguments for the list-markets command.
#[derive(Args, Debug, Clone)]
pub struct ListMarketsArgs {
    /// Report program (tff or dis)
    #[arg(long, default_value = "tff")]
    pub dataset: SourceProgram,

    /// Only markets the taxonomy places in this asset class
    #[arg(long)]
    pub asset_class: Option<AssetClass>,
}

/// Runs the list-markets command.
///
/// # Errors
/// Returns an error if the listing cannot be downloaded.
pub async fn run_list_markets(args: ListMarketsArgs, config: &AppConfig) -> Result<()> {
    let client = SodaClient::from_config(&config.source)?;
    let names = client
        .distinct_market_names(source_url(config, args.dataset))
        .await?;

    let catalog = NameCatalog::new(names);
    let shown: Vec<&str> = match args.asset_class {
        Some(class) => MarketTaxonomy::from_universe(&config.universe).markets_in(&catalog, class),
        None => catalog.names().collect(),
    };

    println!("{} markets ({})", shown.len(), args.dataset);
    for name in shown {
        println!("  {name}");
    }
    Ok(())
}
