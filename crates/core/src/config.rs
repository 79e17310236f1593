use crate::columns::{self, Horizon};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub source: SourceConfig,
    pub storage: StorageConfig,
    pub metrics: MetricsConfig,
    pub universe: UniverseConfig,
}

/// CFTC public reporting API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Traders in Financial Futures collection.
    pub tff_url: String,
    /// Disaggregated (physical commodities) collection.
    pub dis_url: String,
    pub page_size: usize,
    /// Fixed pause between page requests.
    pub pause_ms: u64,
    /// Contract codes per `IN (...)` filter.
    pub in_clause_batch: usize,
    pub request_timeout_secs: u64,
    /// Optional app token for elevated rate limits (`SODA_APP_TOKEN`).
    pub app_token: Option<String>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            tff_url: "https://publicreporting.cftc.gov/resource/gpe5-46if.json".to_string(),
            dis_url: "https://publicreporting.cftc.gov/resource/72hh-3qpy.json".to_string(),
            page_size: 50_000,
            pause_ms: 200,
            in_clause_batch: 50,
            request_timeout_secs: 60,
            app_token: None,
        }
    }
}

/// Locations of the per-stage Parquet files.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
    /// Also write the snapshot as CSV next to the Parquet file.
    pub snapshot_csv: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            snapshot_csv: true,
        }
    }
}

impl StorageConfig {
    /// Raw download for a source program, e.g. `data/raw/tff.parquet`.
    #[must_use]
    pub fn raw_path(&self, program: &str) -> PathBuf {
        self.data_dir.join("raw").join(format!("{program}.parquet"))
    }

    /// Normalized panel for one source program.
    #[must_use]
    pub fn tidy_path(&self, program: &str) -> PathBuf {
        self.processed(&format!("{program}_tidy.parquet"))
    }

    #[must_use]
    pub fn combined_tidy_path(&self) -> PathBuf {
        self.processed("cot_tidy.parquet")
    }

    #[must_use]
    pub fn metrics_path(&self) -> PathBuf {
        self.processed("cot_metrics.parquet")
    }

    #[must_use]
    pub fn snapshot_path(&self) -> PathBuf {
        self.processed("cot_latest_snapshot.parquet")
    }

    #[must_use]
    pub fn snapshot_csv_path(&self) -> PathBuf {
        self.processed("cot_latest_snapshot.csv")
    }

    fn processed(&self, file: &str) -> PathBuf {
        self.data_dir.join("processed").join(file)
    }
}

/// A fixed trailing window, e.g. `5y` = 260 weekly reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowSpec {
    pub tag: String,
    pub periods: usize,
}

impl WindowSpec {
    pub fn new(tag: impl Into<String>, periods: usize) -> Self {
        Self {
            tag: tag.into(),
            periods,
        }
    }
}

/// The whole-history window and its minimum observation floor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpandingSpec {
    pub tag: String,
    pub min_periods: usize,
}

impl Default for ExpandingSpec {
    fn default() -> Self {
        Self {
            tag: "max".to_string(),
            min_periods: 52,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub windows: Vec<WindowSpec>,
    pub expanding: ExpandingSpec,
    /// Tracked expressions that receive score columns.
    pub expressions: Vec<String>,
    /// Quantities that receive raw change columns.
    pub change_bases: Vec<String>,
    pub horizons: Vec<Horizon>,
    pub include_score_changes: bool,
    /// Default descending sort of the snapshot.
    pub snapshot_sort_column: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            windows: vec![WindowSpec::new("3y", 156), WindowSpec::new("5y", 260)],
            expanding: ExpandingSpec::default(),
            expressions: vec![columns::NET.to_string(), columns::PCT_OI_NET.to_string()],
            change_bases: [
                columns::LONG,
                columns::SHORT,
                columns::SPREADING,
                columns::NET,
                columns::OPEN_INTEREST,
                columns::PCT_OI_NET,
                columns::PCT_OI_LONG,
                columns::PCT_OI_SHORT,
            ]
            .iter()
            .map(ToString::to_string)
            .collect(),
            horizons: Horizon::DEFAULTS.to_vec(),
            include_score_changes: true,
            snapshot_sort_column: "pct_oi_net_pctile_5y".to_string(),
        }
    }
}

/// Curated market universe, grouped by sector.
///
/// Financial futures names are the base names used by the TFF report;
/// commodity names are short names resolved to the DIS report's verbose
/// names through `dis_market_map`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UniverseConfig {
    pub tff: BTreeMap<String, Vec<String>>,
    pub dis: BTreeMap<String, Vec<String>>,
    pub dis_market_map: BTreeMap<String, String>,
    /// Similarity floor for fuzzy name reconciliation.
    pub match_cutoff: f64,
}

impl UniverseConfig {
    /// Every sector with its names, TFF sectors first.
    pub fn sectors(&self) -> impl Iterator<Item = (&String, &Vec<String>)> {
        self.tff.iter().chain(self.dis.iter())
    }

    /// Unique names of a universe, in sector then listing order.
    #[must_use]
    pub fn flatten(universe: &BTreeMap<String, Vec<String>>) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for name in universe.values().flatten() {
            if !out.contains(name) {
                out.push(name.clone());
            }
        }
        out
    }
}

fn names(items: &[&str]) -> Vec<String> {
    items.iter().map(ToString::to_string).collect()
}

impl Default for UniverseConfig {
    fn default() -> Self {
        let mut tff = BTreeMap::new();
        tff.insert(
            "Rates".to_string(),
            names(&[
                "FED FUNDS",
                "EURODOLLARS-3M",
                "UST 2Y NOTE",
                "UST 5Y NOTE",
                "UST 10Y NOTE",
                "UST BOND",
                "ULTRA UST BOND",
                "ULTRA UST 10Y",
                "MICRO 10 YEAR YIELD",
                "SOFR-1M",
                "SOFR-3M",
                "EURO SHORT TERM RATE",
            ]),
        );
        tff.insert(
            "FX".to_string(),
            names(&[
                "EURO FX",
                "JAPANESE YEN",
                "BRITISH POUND",
                "SWISS FRANC",
                "AUSTRALIAN DOLLAR",
                "CANADIAN DOLLAR",
                "NZ DOLLAR",
                "MEXICAN PESO",
                "USD INDEX",
                "BRAZILIAN REAL",
                "SO AFRICAN RAND",
            ]),
        );
        tff.insert(
            "Equities".to_string(),
            names(&[
                "E-MINI S&P 500",
                "NASDAQ MINI",
                "NIKKEI STOCK AVERAGE",
                "DJIA x $5",
                "NIKKEI STOCK AVERAGE YEN DENOM",
                "VIX FUTURES",
                "MSCI EAFE",
                "MSCI EM INDEX",
            ]),
        );
        tff.insert(
            "Crypto".to_string(),
            names(&["BITCOIN", "DOGECOIN", "SOL"]),
        );

        let mut dis = BTreeMap::new();
        dis.insert(
            "Commodities".to_string(),
            names(&[
                "GOLD",
                "SILVER",
                "GASOLINE RBOB",
                "CRUDE OIL, LIGHT SWEET-WTI",
                "WTI-PHYSICAL",
                "COPPER- #1",
                "PALLADIUM",
                "PLATINUM",
                "CORN",
                "OATS",
                "COCOA",
                "COFFEE C",
                "SUGAR NO. 11",
                "SOYBEANS",
            ]),
        );

        let dis_market_map = [
            ("GOLD", "GOLD - COMMODITY EXCHANGE INC."),
            ("SILVER", "SILVER - COMMODITY EXCHANGE INC."),
            ("GASOLINE RBOB", "GASOLINE RBOB - NEW YORK MERCANTILE EXCHANGE"),
            (
                "CRUDE OIL, LIGHT SWEET-WTI",
                "CRUDE OIL, LIGHT SWEET - NEW YORK MERCANTILE EXCHANGE",
            ),
            ("WTI-PHYSICAL", "WTI CRUDE OIL - PHYSICAL"),
            ("COPPER- #1", "COPPER GRADE #1 - COMMODITY EXCHANGE INC."),
            ("PALLADIUM", "PALLADIUM - NEW YORK MERCANTILE EXCHANGE"),
            ("PLATINUM", "PLATINUM - NEW YORK MERCANTILE EXCHANGE"),
            ("CORN", "CORN - CHICAGO BOARD OF TRADE"),
            ("OATS", "OATS - CHICAGO BOARD OF TRADE"),
            ("COCOA", "COCOA - ICE FUTURES U.S."),
            ("COFFEE C", "COFFEE C - ICE FUTURES U.S."),
            ("SUGAR NO. 11", "SUGAR NO. 11 - ICE FUTURES U.S."),
            ("SOYBEANS", "SOYBEANS - CHICAGO BOARD OF TRADE"),
        ]
        .into_iter()
        .map(|(short, api)| (short.to_string(), api.to_string()))
        .collect();

        Self {
            tff,
            dis,
            dis_market_map,
            match_cutoff: 0.75,
        }
    }
}
