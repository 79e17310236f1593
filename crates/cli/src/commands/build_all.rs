//! Build-all CLI command.
//!
//! Runs the whole pipeline. Both programs are downloaded before anything is
//! written, so a failed request leaves the data directory untouched.

use anyhow::Result;
use clap::Args;
use cot_cftc::SodaClient;
use cot_core::AppConfig;
use cot_data::{ParquetStorage, SourceProgram};

use crate::pipeline::{self, FetchSelection};

/// Arguments for the build-all command.
#[derive(Args, Debug, Clone)]
pub struct BuildAllArgs {
    /// Match configured TFF names exactly instead of fuzzily
    #[arg(long, default_value = "false")]
    pub exact: bool,
}

/// Pipeline counts reported at the end of a run.
#[derive(Debug, Default, Clone)]
struct BuildStats {
    raw_rows: usize,
    tidy_rows: usize,
    metric_columns: usize,
    series: usize,
}

impl BuildStats {
    fn summary(&self) -> String {
        format!(
            "Raw rows: {}, Tidy rows: {}, Metric columns: {}, Series: {}",
            self.raw_rows, self.tidy_rows, self.metric_columns, self.series
        )
    }
}

/// Runs the build-all command.
///
/// # Errors
/// Returns an error on the first failed request, transform or write.
pub async fn run_build_all(args: BuildAllArgs, config: &AppConfig) -> Result<()> {
    let client = SodaClient::from_config(&config.source)?;
    let selection = FetchSelection::Universe { exact: args.exact };
    let programs = [SourceProgram::Tff, SourceProgram::Disaggregated];

    let mut raws = Vec::with_capacity(programs.len());
    for program in programs {
        raws.push((program, pipeline::fetch(&client, config, program, &selection).await?));
    }

    let mut stats = BuildStats::default();
    let storage = &config.storage;
    let mut panels = Vec::with_capacity(raws.len());
    for (program, raw) in &raws {
        ParquetStorage::write_raw(storage.raw_path(program.slug()), raw)?;
        let tidy = pipeline::normalize_stage(raw, *program, None)?;
        ParquetStorage::write_panel(storage.tidy_path(program.slug()), &tidy)?;
        stats.raw_rows += raw.len();
        stats.tidy_rows += tidy.len();
        panels.push(tidy);
    }

    let combined = pipeline::combine_stage(config, panels);
    ParquetStorage::write_panel(storage.combined_tidy_path(), &combined)?;

    let (enriched, snapshot) = pipeline::metrics_stage(config, &combined)?;
    pipeline::write_metrics_outputs(config, &enriched, &snapshot)?;
    stats.metric_columns = enriched.columns().len();
    stats.series = snapshot.len();

    println!("Build complete. {}", stats.summary());
    Ok(())
}
