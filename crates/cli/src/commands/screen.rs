//! Screen CLI command: print a sector's snapshot scores, changes and flags.

use anyhow::Result;
use clap::Args;
use cot_core::columns::PCT_OI_NET;
use cot_core::{AppConfig, Horizon, Statistic};
use cot_data::ParquetStorage;
use cot_metrics::{screen, FlagThresholds, ScreenFormatter, ScreenQuery};

/// Arguments for the screen command.
#[derive(Args, Debug, Clone)]
pub struct ScreenArgs {
    /// Asset class (Rates, FX, Equities, Commodities, Crypto, Other); all when omitted
    #[arg(long)]
    pub asset_class: Option<String>,

    /// Scored expression
    #[arg(long, default_value = PCT_OI_NET)]
    pub expression: String,

    /// pctile, minmax or z
    #[arg(long, default_value = "pctile")]
    pub statistic: Statistic,

    /// Window tag (3y, 5y, max)
    #[arg(long, default_value = "5y")]
    pub window: String,

    /// Score change horizon in weeks (e.g. 4 or 4w)
    #[arg(long, default_value = "4w")]
    pub horizon: Horizon,
}

/// Runs the screen command.
///
/// # Errors
/// Returns an error if the snapshot cannot be read.
pub fn run_screen(args: ScreenArgs, config: &AppConfig) -> Result<()> {
    let snapshot = ParquetStorage::read_panel(config.storage.snapshot_path())?;
    let query = ScreenQuery {
        asset_class: args.asset_class,
        expression: args.expression,
        statistic: args.statistic,
        window: args.window,
        horizon: args.horizon,
    };

    let rows = screen(&snapshot, &query, &FlagThresholds::default());
    print!("{}", ScreenFormatter::format(&query, &rows));
    Ok(())
}
