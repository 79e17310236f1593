//! Pipeline stages shared by the individual commands and `build-all`.
//!
//! Fetching is async and touches the network; every other stage is a pure
//! transform over in-memory tables followed by a Parquet write.

use anyhow::{Context, Result};
use cot_cftc::{resolve_mapped_targets, resolve_targets, SodaClient};
use cot_core::{AppConfig, Panel, UniverseConfig};
use cot_data::{
    normalize, CsvStorage, ExactMatcher, FuzzyMatcher, MarketTaxonomy, NameCatalog, NameMatcher,
    ParquetStorage, RawTable, SourceProgram, TraderGroup,
};
use cot_metrics::{MetricsEngine, SnapshotReducer};

/// Which rows of a program to download.
#[derive(Debug, Clone)]
pub enum FetchSelection {
    /// Configured universe, resolved against the API market listing.
    /// DIS names always go through the curated map.
    Universe { exact: bool },
    /// Explicit contract codes.
    Codes(Vec<String>),
}

pub fn source_url(config: &AppConfig, program: SourceProgram) -> &str {
    match program {
        SourceProgram::Tff => &config.source.tff_url,
        SourceProgram::Disaggregated => &config.source.dis_url,
    }
}

pub fn universe_names(config: &AppConfig, program: SourceProgram) -> Vec<String> {
    match program {
        SourceProgram::Tff => UniverseConfig::flatten(&config.universe.tff),
        SourceProgram::Disaggregated => UniverseConfig::flatten(&config.universe.dis),
    }
}

/// Downloads one program's raw table.
pub async fn fetch(
    client: &SodaClient,
    config: &AppConfig,
    program: SourceProgram,
    selection: &FetchSelection,
) -> Result<RawTable> {
    let url = source_url(config, program);

    let table = match (selection, program) {
        (FetchSelection::Codes(codes), _) => {
            client
                .download_by_codes(url, codes, config.source.in_clause_batch, None)
                .await?
        }
        (FetchSelection::Universe { .. }, SourceProgram::Disaggregated) => {
            let targets = resolve_mapped_targets(
                &universe_names(config, program),
                &config.universe.dis_market_map,
            );
            client.download_markets(url, &targets).await?
        }
        (FetchSelection::Universe { exact }, SourceProgram::Tff) => {
            let available = client.distinct_market_names(url).await?;
            let catalog = NameCatalog::new(available);
            let matcher: Box<dyn NameMatcher> = if *exact {
                Box::new(ExactMatcher)
            } else {
                Box::new(FuzzyMatcher::new(config.universe.match_cutoff))
            };
            let targets = resolve_targets(&universe_names(config, program), &catalog, matcher.as_ref());
            client.download_markets(url, &targets).await?
        }
    };

    tracing::info!(program = %program, rows = table.len(), "Fetched raw table");
    Ok(table)
}

/// Raw table to tidy panel, defaulting to the program's speculative group.
pub fn normalize_stage(
    raw: &RawTable,
    program: SourceProgram,
    group: Option<TraderGroup>,
) -> Result<Panel> {
    let group = group.unwrap_or_else(|| program.default_group());
    normalize(raw, program, group)
        .with_context(|| format!("Failed to normalize {program} rows for {group}"))
}

/// Concatenates tidy panels and attaches asset classes.
pub fn combine_stage(config: &AppConfig, panels: Vec<Panel>) -> Panel {
    let mut combined = Panel::concat(panels).sorted_by_series();
    MarketTaxonomy::from_universe(&config.universe).annotate(&mut combined);
    tracing::info!(rows = combined.len(), "Combined tidy panel");
    combined
}

/// Enriched panel and its latest snapshot.
pub fn metrics_stage(config: &AppConfig, tidy: &Panel) -> Result<(Panel, Panel)> {
    let enriched = MetricsEngine::new(config.metrics.clone())
        .compute(tidy)
        .context("Failed to compute metrics")?;
    let snapshot = SnapshotReducer::from_config(&config.metrics).reduce(&enriched);
    Ok((enriched, snapshot))
}

pub fn write_metrics_outputs(config: &AppConfig, enriched: &Panel, snapshot: &Panel) -> Result<()> {
    let storage = &config.storage;
    ParquetStorage::write_panel(storage.metrics_path(), enriched)?;
    ParquetStorage::write_panel(storage.snapshot_path(), snapshot)?;
    if storage.snapshot_csv {
        CsvStorage::write_panel(storage.snapshot_csv_path(), snapshot)?;
    }
    tracing::info!(
        metrics = %storage.metrics_path().display(),
        snapshot = %storage.snapshot_path().display(),
        "Wrote metrics outputs"
    );
    Ok(())
}
