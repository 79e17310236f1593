//! Universe downloads: by market name, by contract code, and the distinct
//! market name listing used to reconcile configured names.

use crate::client::SodaClient;
use crate::error::FetchError;
use crate::query::{SodaQuery, MARKET_NAME_FIELD};
use cot_data::{build_market_name_map, NameCatalog, NameMatcher, RawTable};
use std::collections::BTreeMap;

/// Raw column recording the configured name a row was fetched for.
pub const REQUESTED_MARKET_COL: &str = "__requested_market__";
/// Raw column recording the API name the request resolved to.
pub const MATCHED_MARKET_COL: &str = "__matched_market__";

/// A configured market and the API name it resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarketTarget {
    pub requested: String,
    pub api_name: String,
}

impl MarketTarget {
    pub fn new(requested: impl Into<String>, api_name: impl Into<String>) -> Self {
        Self {
            requested: requested.into(),
            api_name: api_name.into(),
        }
    }
}

/// Resolves configured names against the API listing. Unmatched names are dropped.
#[must_use]
pub fn resolve_targets(
    requested: &[String],
    available: &NameCatalog,
    matcher: &dyn NameMatcher,
) -> Vec<MarketTarget> {
    build_market_name_map(requested, available, matcher)
        .into_iter()
        .filter_map(|(name, hit)| hit.map(|api_name| MarketTarget::new(name, api_name)))
        .collect()
}

/// Resolves configured names through a curated name map. Unmapped names are
/// skipped with a notice.
#[must_use]
pub fn resolve_mapped_targets(
    requested: &[String],
    map: &BTreeMap<String, String>,
) -> Vec<MarketTarget> {
    requested
        .iter()
        .filter_map(|name| match map.get(name) {
            Some(api_name) => Some(MarketTarget::new(name.clone(), api_name.clone())),
            None => {
                tracing::info!(market = %name, "No curated API name; skipping");
                None
            }
        })
        .collect()
}

impl SodaClient {
    /// Downloads the full history of each target, one market at a time.
    ///
    /// Rows are tagged with the requested and matched names.
    ///
    /// # Errors
    /// Aborts on the first failed request.
    pub async fn download_markets(
        &self,
        url: &str,
        targets: &[MarketTarget],
    ) -> Result<RawTable, FetchError> {
        let mut out = RawTable::new();
        for target in targets {
            let mut table = self
                .fetch_all(url, &SodaQuery::market_name(&target.api_name))
                .await?;
            if table.is_empty() {
                tracing::warn!(market = %target.api_name, "Market returned no rows");
                continue;
            }
            table.tag_rows(REQUESTED_MARKET_COL, &target.requested);
            table.tag_rows(MATCHED_MARKET_COL, &target.api_name);
            out.extend(table);
        }
        tracing::info!(markets = targets.len(), rows = out.len(), "Downloaded markets by name");
        Ok(out)
    }

    /// Downloads the full history of the given contract codes, `batch` codes
    /// per `IN (...)` filter.
    ///
    /// # Errors
    /// Aborts on the first failed request.
    pub async fn download_by_codes(
        &self,
        url: &str,
        codes: &[String],
        batch: usize,
        select: Option<&str>,
    ) -> Result<RawTable, FetchError> {
        let mut unique: Vec<&String> = codes.iter().filter(|c| !c.trim().is_empty()).collect();
        unique.sort();
        unique.dedup();

        let mut out = RawTable::new();
        for chunk in unique.chunks(batch.max(1)) {
            let mut query = SodaQuery::contract_codes(chunk);
            if let Some(select) = select {
                query = query.select(select);
            }
            out.extend(self.fetch_all(url, &query).await?);
        }
        tracing::info!(codes = unique.len(), rows = out.len(), "Downloaded markets by code");
        Ok(out)
    }

    /// Every distinct `market_and_exchange_names` value, sorted.
    ///
    /// # Errors
    /// Aborts on the first failed request.
    pub async fn distinct_market_names(&self, url: &str) -> Result<Vec<String>, FetchError> {
        let table = self
            .fetch_all(url, &SodaQuery::distinct_market_names())
            .await?;
        Ok(table.distinct(MARKET_NAME_FIELD))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cot_data::FuzzyMatcher;

    #[test]
    fn resolves_fuzzy_targets_and_drops_misses() {
        let catalog = NameCatalog::new([
            "CRUDE OIL, LIGHT SWEET - NEW YORK MERCANTILE EXCHANGE",
            "ETHER CASH SETTLED - CHICAGO MERCANTILE EXCHANGE",
        ]);
        let requested = vec![
            "CRUDE OIL LIGHT SWEET WTI".to_string(),
            "LUMBER".to_string(),
        ];
        let targets = resolve_targets(&requested, &catalog, &FuzzyMatcher::default());
        assert_eq!(
            targets,
            vec![MarketTarget::new(
                "CRUDE OIL LIGHT SWEET WTI",
                "CRUDE OIL, LIGHT SWEET - NEW YORK MERCANTILE EXCHANGE"
            )]
        );
    }

    #[test]
    fn mapped_targets_skip_unmapped() {
        let mut map = BTreeMap::new();
        map.insert("GOLD".to_string(), "GOLD - COMMODITY EXCHANGE INC.".to_string());
        let requested = vec!["GOLD".to_string(), "PALLADIUM".to_string()];
        let targets = resolve_mapped_targets(&requested, &map);
        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].api_name, "GOLD - COMMODITY EXCHANGE INC.");
    }
}
