//! Normalize CLI command: raw Parquet to tidy Parquet for one program.

use anyhow::Result;
use clap::Args;
use cot_core::AppConfig;
use cot_data::{ParquetStorage, SourceProgram, TraderGroup};

use crate::pipeline;

/// Arguments for the normalize command.
#[derive(Args, Debug, Clone)]
pub struct NormalizeArgs {
    /// Report program (tff or dis)
    #[arg(long)]
    pub dataset: SourceProgram,

    /// Trader group; defaults to leveraged funds (tff) or managed money (dis)
    #[arg(long)]
    pub group: Option<TraderGroup>,
}

/// Runs the normalize command.
///
/// # Errors
/// Returns an error if the raw table is missing or lacks required columns.
pub fn run_normalize(args: NormalizeArgs, config: &AppConfig) -> Result<()> {
    let storage = &config.storage;
    let raw = ParquetStorage::read_raw(storage.raw_path(args.dataset.slug()))?;
    let tidy = pipeline::normalize_stage(&raw, args.dataset, args.group)?;

    let path = storage.tidy_path(args.dataset.slug());
    ParquetStorage::write_panel(&path, &tidy)?;
    println!(
        "Normalized {} raw rows into {} tidy rows -> {}",
        raw.len(),
        tidy.len(),
        path.display()
    );
    Ok(())
}
