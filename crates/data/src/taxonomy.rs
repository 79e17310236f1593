//! Market taxonomy: sector labels for exchange-qualified market names.

use crate::name_match::NameCatalog;
use cot_core::{Panel, UniverseConfig};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssetClass {
    Rates,
    #[serde(rename = "FX")]
    Fx,
    Equities,
    Commodities,
    Crypto,
    /// Sentinel for names missing from the table.
    Other,
}

impl AssetClass {
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            AssetClass::Rates => "Rates",
            AssetClass::Fx => "FX",
            AssetClass::Equities => "Equities",
            AssetClass::Commodities => "Commodities",
            AssetClass::Crypto => "Crypto",
            AssetClass::Other => "Other",
        }
    }
}

impl fmt::Display for AssetClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for AssetClass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "rates" => Ok(AssetClass::Rates),
            "fx" => Ok(AssetClass::Fx),
            "equities" => Ok(AssetClass::Equities),
            "commodities" => Ok(AssetClass::Commodities),
            "crypto" => Ok(AssetClass::Crypto),
            "other" => Ok(AssetClass::Other),
            _ => Err(format!("unknown asset class '{s}'")),
        }
    }
}

/// Base name of a market: the text before the first `" - "`, trimmed.
///
/// `"CORN - CHICAGO BOARD OF TRADE"` becomes `"CORN"`.
#[must_use]
pub fn base_name(market: &str) -> &str {
    market.split(" - ").next().unwrap_or(market).trim()
}

/// Immutable base-name to asset-class table.
#[derive(Debug, Clone, Default)]
pub struct MarketTaxonomy {
    by_base: HashMap<String, AssetClass>,
}

impl MarketTaxonomy {
    pub fn new(entries: impl IntoIterator<Item = (String, AssetClass)>) -> Self {
        Self {
            by_base: entries.into_iter().collect(),
        }
    }

    /// Builds the table from the configured universe.
    ///
    /// Commodity short names are registered together with the base name of
    /// the API name they map to, because reports carry the API spelling.
    /// Sectors whose label is not a known asset class are skipped.
    #[must_use]
    pub fn from_universe(universe: &UniverseConfig) -> Self {
        let mut by_base = HashMap::new();
        for (sector, names) in universe.sectors() {
            let Ok(class) = sector.parse::<AssetClass>() else {
                tracing::warn!(sector = %sector, "Ignoring unknown sector label in universe");
                continue;
            };
            for name in names {
                by_base.insert(name.trim().to_string(), class);
                if let Some(api_name) = universe.dis_market_map.get(name) {
                    by_base.insert(base_name(api_name).to_string(), class);
                }
            }
        }
        Self { by_base }
    }

    #[must_use]
    pub fn classify(&self, market: &str) -> AssetClass {
        self.by_base
            .get(base_name(market))
            .copied()
            .unwrap_or(AssetClass::Other)
    }

    /// Fills `asset_class` on every row of the panel.
    pub fn annotate(&self, panel: &mut Panel) {
        let mut other = 0usize;
        for row in panel.rows_mut() {
            let class = self.classify(&row.market);
            if class == AssetClass::Other {
                other += 1;
            }
            row.asset_class = Some(class.label().to_string());
        }
        if other > 0 {
            tracing::info!(rows = other, "Rows without a taxonomy entry labeled Other");
        }
    }

    /// Distinct markets of `catalog` that classify as `class`.
    #[must_use]
    pub fn markets_in<'a>(&self, catalog: &'a NameCatalog, class: AssetClass) -> Vec<&'a str> {
        catalog
            .names()
            .filter(|name| self.classify(name) == class)
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.by_base.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_base.is_empty()
    }
}
