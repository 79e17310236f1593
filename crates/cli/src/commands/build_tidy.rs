//! Build-tidy CLI command: combine per-program tidy panels.

use anyhow::{bail, Result};
use cot_core::AppConfig;
use cot_data::{ParquetStorage, SourceProgram};

use crate::pipeline;

/// Runs the build-tidy command. Programs without a tidy file are skipped.
///
/// # Errors
/// Returns an error if no tidy panel exists or a file cannot be read or written.
pub fn run_build_tidy(config: &AppConfig) -> Result<()> {
    let storage = &config.storage;
    let mut panels = Vec::new();

    for program in [SourceProgram::Tff, SourceProgram::Disaggregated] {
        let path = storage.tidy_path(program.slug());
        if !path.exists() {
            tracing::warn!(path = %path.display(), "Tidy panel missing; skipping");
            continue;
        }
        panels.push(ParquetStorage::read_panel(&path)?);
    }

    if panels.is_empty() {
        bail!("No tidy panels under {}; run normalize first", storage.data_dir.display());
    }

    let combined = pipeline::combine_stage(config, panels);
    let path = storage.combined_tidy_path();
    ParquetStorage::write_panel(&path, &combined)?;
    println!("Combined {} rows -> {}", combined.len(), path.display());
    Ok(())
}
