//! Fetch CLI command.
//!
//! Downloads the configured universe of one report program and stores it as
//! the raw Parquet table.

use anyhow::{bail, Result};
use clap::{Args, ValueEnum};
use cot_cftc::SodaClient;
use cot_core::AppConfig;
use cot_data::{ParquetStorage, SourceProgram};

use crate::pipeline::{self, FetchSelection};

/// How markets are selected upstream.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchBy {
    /// Configured market names
    Names,
    /// Explicit contract codes (--codes)
    Codes,
}

/// Arguments for the fetch command.
#[derive(Args, Debug, Clone)]
pub struct FetchArgs {
    /// Report program (tff or dis)
    #[arg(long)]
    pub dataset: SourceProgram,

    /// Selection mode
    #[arg(long, value_enum, default_value = "names")]
    pub by: FetchBy,

    /// Contract codes, comma separated (with --by codes)
    #[arg(long, value_delimiter = ',')]
    pub codes: Vec<String>,

    /// Match configured names exactly instead of fuzzily
    #[arg(long, default_value = "false")]
    pub exact: bool,
}

impl FetchArgs {
    pub(crate) fn selection(&self) -> Result<FetchSelection> {
        match self.by {
            FetchBy::Names => Ok(FetchSelection::Universe { exact: self.exact }),
            FetchBy::Codes if self.codes.is_empty() => bail!("--by codes requires --codes"),
            FetchBy::Codes => Ok(FetchSelection::Codes(self.codes.clone())),
        }
    }
}

/// Runs the fetch command.
///
/// # Errors
/// Returns an error if any request fails or the raw table cannot be written.
pub async fn run_fetch(args: FetchArgs, config: &AppConfig) -> Result<()> {
    let selection = args.selection()?;
    let client = SodaClient::from_config(&config.source)?;

    let raw = pipeline::fetch(&client, config, args.dataset, &selection).await?;
    if raw.is_empty() {
        tracing::warn!(program = %args.dataset, "No rows fetched; raw table not written");
        return Ok(());
    }

    let path = config.storage.raw_path(args.dataset.slug());
    ParquetStorage::write_raw(&path, &raw)?;
    println!("Fetched {} rows -> {}", raw.len(), path.display());
    Ok(())
}
