//! Metrics CLI command: combined tidy panel to metrics and snapshot files.

use anyhow::Result;
use cot_core::AppConfig;
use cot_data::ParquetStorage;

use crate::pipeline;

/// Runs the metrics command.
///
/// # Errors
/// Returns an error if the combined tidy panel cannot be read or outputs cannot be written.
pub fn run_metrics(config: &AppConfig) -> Result<()> {
    let tidy = ParquetStorage::read_panel(config.storage.combined_tidy_path())?;
    let (enriched, snapshot) = pipeline::metrics_stage(config, &tidy)?;
    pipeline::write_metrics_outputs(config, &enriched, &snapshot)?;

    println!(
        "Metrics: {} rows x {} columns; snapshot: {} series",
        enriched.len(),
        enriched.columns().len(),
        snapshot.len()
    );
    Ok(())
}
