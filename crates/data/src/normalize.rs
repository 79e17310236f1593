//! Panel normalizer.
//!
//! Maps raw report rows of either source program onto the canonical tidy
//! schema: open interest, long/short/spreading for one trader group, and the
//! derived net and %OI quantities.

use crate::raw::{RawRow, RawTable};
use chrono::{NaiveDate, NaiveDateTime};
use cot_core::columns;
use cot_core::value::{parse_numeric, share_of, sub};
use cot_core::{CotError, Panel, RowMeta, SeriesKey};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

pub const DATE_COL: &str = "report_date_as_yyyy_mm_dd";
pub const OPEN_INTEREST_COL: &str = "open_interest_all";
pub const MARKET_COL: &str = "market_and_exchange_names";
pub const CODE_COL: &str = "cftc_contract_market_code";
pub const CONTRACT_NAME_COL: &str = "contract_market_name";

/// Report program a raw table came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceProgram {
    /// Traders in Financial Futures.
    Tff,
    /// Disaggregated commodities.
    Disaggregated,
}

impl SourceProgram {
    /// Literal written to the `dataset` field.
    #[must_use]
    pub fn dataset_tag(&self) -> &'static str {
        match self {
            SourceProgram::Tff => "TFF",
            SourceProgram::Disaggregated => "DIS",
        }
    }

    /// Lowercase name used in file names and on the command line.
    #[must_use]
    pub fn slug(&self) -> &'static str {
        match self {
            SourceProgram::Tff => "tff",
            SourceProgram::Disaggregated => "dis",
        }
    }

    /// The speculative group tracked for this program by default.
    #[must_use]
    pub fn default_group(&self) -> TraderGroup {
        match self {
            SourceProgram::Tff => TraderGroup::LeveragedFunds,
            SourceProgram::Disaggregated => TraderGroup::ManagedMoney,
        }
    }
}

impl fmt::Display for SourceProgram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dataset_tag())
    }
}

impl FromStr for SourceProgram {
    type Err = CotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "tff" | "financial" | "financial-futures" => Ok(SourceProgram::Tff),
            "dis" | "disaggregated" => Ok(SourceProgram::Disaggregated),
            _ => Err(CotError::UnknownSourceProgram(s.to_string())),
        }
    }
}

/// Trader category whose positions are extracted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TraderGroup {
    Dealer,
    AssetManager,
    LeveragedFunds,
    ManagedMoney,
}

impl TraderGroup {
    /// Literal written to the `group` field.
    #[must_use]
    pub fn tag(&self) -> &'static str {
        match self {
            TraderGroup::Dealer => "dealer",
            TraderGroup::AssetManager => "asset_manager",
            TraderGroup::LeveragedFunds => "leveraged_funds",
            TraderGroup::ManagedMoney => "managed_money",
        }
    }

    #[must_use]
    pub fn program(&self) -> SourceProgram {
        match self {
            TraderGroup::Dealer | TraderGroup::AssetManager | TraderGroup::LeveragedFunds => {
                SourceProgram::Tff
            }
            TraderGroup::ManagedMoney => SourceProgram::Disaggregated,
        }
    }

    /// Source columns for (long, short, spreading).
    #[must_use]
    pub fn position_columns(&self) -> (&'static str, &'static str, &'static str) {
        match self {
            TraderGroup::Dealer => (
                "dealer_positions_long_all",
                "dealer_positions_short_all",
                "dealer_positions_spread_all",
            ),
            TraderGroup::AssetManager => (
                "asset_mgr_positions_long_all",
                "asset_mgr_positions_short_all",
                "asset_mgr_positions_spread_all",
            ),
            TraderGroup::LeveragedFunds => (
                "lev_money_positions_long",
                "lev_money_positions_short",
                "lev_money_positions_spread",
            ),
            TraderGroup::ManagedMoney => (
                "m_money_positions_long_all",
                "m_money_positions_short_all",
                "m_money_positions_spread",
            ),
        }
    }
}

impl fmt::Display for TraderGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for TraderGroup {
    type Err = CotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dealer" => Ok(TraderGroup::Dealer),
            "asset_mgr" | "asset_manager" => Ok(TraderGroup::AssetManager),
            "lev_money" | "leveraged_funds" => Ok(TraderGroup::LeveragedFunds),
            "managed_money" | "m_money" => Ok(TraderGroup::ManagedMoney),
            _ => Err(CotError::UnknownTraderGroup(s.to_string())),
        }
    }
}

/// Parses a report date such as `2024-01-02` or `2024-01-02T00:00:00.000`.
#[must_use]
pub fn parse_report_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(ts) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(ts.date());
    }
    raw.get(..10)
        .and_then(|prefix| NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok())
}

struct Observation {
    market: String,
    contract_name: String,
    open_interest: Option<f64>,
    long: Option<f64>,
    short: Option<f64>,
    spreading: Option<f64>,
}

fn cell<'a>(row: &'a RawRow, column: &str) -> &'a str {
    row.get(column).map_or("", String::as_str)
}

/// Normalizes one trader group of a raw table into a tidy panel.
///
/// Rows sharing (contract code, date) are deduplicated keeping the last one
/// in input order. Rows without a parseable date or a contract code are
/// dropped. Output is sorted by (contract code, date).
///
/// # Errors
/// - `CotError::UnsupportedGroup` if `group` is not reported by `program`
/// - `CotError::Schema` naming every required column absent from `raw`
pub fn normalize(
    raw: &RawTable,
    program: SourceProgram,
    group: TraderGroup,
) -> Result<Panel, CotError> {
    if group.program() != program {
        return Err(CotError::UnsupportedGroup {
            program: program.dataset_tag().to_string(),
            group: group.tag().to_string(),
        });
    }

    let (long_col, short_col, spread_col) = group.position_columns();
    let required = [
        CONTRACT_NAME_COL,
        MARKET_COL,
        CODE_COL,
        DATE_COL,
        OPEN_INTEREST_COL,
        long_col,
        short_col,
        spread_col,
    ];
    let missing = raw.missing_columns(&required);
    if !missing.is_empty() {
        return Err(CotError::schema(
            format!("normalize {program}/{group}"),
            missing,
        ));
    }

    // Later inserts overwrite earlier ones: last duplicate wins.
    let mut latest: BTreeMap<(String, NaiveDate), Observation> = BTreeMap::new();
    let mut dropped = 0usize;

    for row in raw.rows() {
        let code = cell(row, CODE_COL).trim();
        let Some(date) = parse_report_date(cell(row, DATE_COL)) else {
            dropped += 1;
            continue;
        };
        if code.is_empty() {
            dropped += 1;
            continue;
        }

        latest.insert(
            (code.to_string(), date),
            Observation {
                market: cell(row, MARKET_COL).trim().to_string(),
                contract_name: cell(row, CONTRACT_NAME_COL).trim().to_string(),
                open_interest: parse_numeric(cell(row, OPEN_INTEREST_COL)),
                long: parse_numeric(cell(row, long_col)),
                short: parse_numeric(cell(row, short_col)),
                spreading: parse_numeric(cell(row, spread_col)),
            },
        );
    }

    if dropped > 0 {
        tracing::warn!(
            program = %program,
            dropped,
            "Dropped rows without a report date or contract code"
        );
    }

    let duplicates = raw.len() - dropped - latest.len();
    let mut rows = Vec::with_capacity(latest.len());
    let mut open_interest = Vec::with_capacity(latest.len());
    let mut long = Vec::with_capacity(latest.len());
    let mut short = Vec::with_capacity(latest.len());
    let mut spreading = Vec::with_capacity(latest.len());

    for ((code, date), obs) in latest {
        rows.push(RowMeta {
            key: SeriesKey::new(program.dataset_tag(), group.tag(), code),
            date,
            market: obs.market,
            contract_name: obs.contract_name,
            asset_class: None,
        });
        open_interest.push(obs.open_interest);
        long.push(obs.long);
        short.push(obs.short);
        spreading.push(obs.spreading);
    }

    let net: Vec<Option<f64>> = long.iter().zip(&short).map(|(l, s)| sub(*l, *s)).collect();
    let pct = |position: &[Option<f64>]| -> Vec<Option<f64>> {
        position
            .iter()
            .zip(&open_interest)
            .map(|(p, oi)| share_of(*p, *oi))
            .collect()
    };
    let pct_oi_net = pct(&net);
    let pct_oi_long = pct(&long);
    let pct_oi_short = pct(&short);

    let mut panel = Panel::new(rows);
    for (name, values) in [
        (columns::OPEN_INTEREST, open_interest),
        (columns::LONG, long),
        (columns::SHORT, short),
        (columns::SPREADING, spreading),
        (columns::NET, net),
        (columns::PCT_OI_NET, pct_oi_net),
        (columns::PCT_OI_LONG, pct_oi_long),
        (columns::PCT_OI_SHORT, pct_oi_short),
    ] {
        panel.insert_column(name, values)?;
    }

    tracing::info!(
        program = %program,
        group = %group,
        rows = panel.len(),
        duplicates,
        "Normalized raw report rows"
    );

    Ok(panel)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tff_row(code: &str, date: &str, oi: &str, long: &str, short: &str) -> RawRow {
        [
            (CONTRACT_NAME_COL, "EURO FX"),
            (MARKET_COL, "EURO FX - CHICAGO MERCANTILE EXCHANGE"),
            (CODE_COL, code),
            (DATE_COL, date),
            (OPEN_INTEREST_COL, oi),
            ("lev_money_positions_long", long),
            ("lev_money_positions_short", short),
            ("lev_money_positions_spread", "10"),
        ]
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect()
    }

    #[test]
    fn derives_net_and_pct_oi() {
        let raw = RawTable::from_rows([tff_row("099741", "2024-01-02T00:00:00.000", "1000", "300", "100")]);
        let panel = normalize(&raw, SourceProgram::Tff, TraderGroup::LeveragedFunds).unwrap();

        assert_eq!(panel.len(), 1);
        let row = &panel.rows()[0];
        assert_eq!(row.key, SeriesKey::new("TFF", "leveraged_funds", "099741"));
        assert_eq!(row.date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(panel.value(0, columns::NET), Some(200.0));
        assert_eq!(panel.value(0, columns::PCT_OI_NET), Some(0.2));
        assert_eq!(panel.value(0, columns::PCT_OI_LONG), Some(0.3));
        assert_eq!(panel.value(0, columns::PCT_OI_SHORT), Some(0.1));
    }

    #[test]
    fn pct_oi_is_undefined_for_non_positive_or_missing_open_interest() {
        let raw = RawTable::from_rows([
            tff_row("1", "2024-01-02", "0", "300", "100"),
            tff_row("1", "2024-01-09", "-5", "300", "100"),
            tff_row("1", "2024-01-16", "", "300", "100"),
            tff_row("1", "2024-01-23", "garbage", "300", "100"),
        ]);
        let panel = normalize(&raw, SourceProgram::Tff, TraderGroup::LeveragedFunds).unwrap();

        assert_eq!(panel.len(), 4);
        for i in 0..4 {
            assert_eq!(panel.value(i, columns::NET), Some(200.0));
            assert_eq!(panel.value(i, columns::PCT_OI_NET), None);
            assert_eq!(panel.value(i, columns::PCT_OI_LONG), None);
        }
        assert_eq!(panel.value(2, columns::OPEN_INTEREST), None);
    }

    #[test]
    fn unparseable_positions_become_undefined_not_zero() {
        let raw = RawTable::from_rows([tff_row("1", "2024-01-02", "1000", "n/a", "100")]);
        let panel = normalize(&raw, SourceProgram::Tff, TraderGroup::LeveragedFunds).unwrap();
        assert_eq!(panel.value(0, columns::LONG), None);
        assert_eq!(panel.value(0, columns::NET), None);
        assert_eq!(panel.value(0, columns::SHORT), Some(100.0));
    }

    #[test]
    fn duplicate_code_and_date_keeps_last_row() {
        let raw = RawTable::from_rows([
            tff_row("1", "2024-01-02", "1000", "300", "100"),
            tff_row("2", "2024-01-02", "1000", "1", "1"),
            tff_row("1", "2024-01-02", "1000", "500", "100"),
        ]);
        let panel = normalize(&raw, SourceProgram::Tff, TraderGroup::LeveragedFunds).unwrap();

        assert_eq!(panel.len(), 2);
        assert_eq!(panel.rows()[0].key.cftc_code, "1");
        assert_eq!(panel.value(0, columns::LONG), Some(500.0));
        assert_eq!(panel.value(0, columns::NET), Some(400.0));
    }

    #[test]
    fn output_is_sorted_by_code_then_date() {
        let raw = RawTable::from_rows([
            tff_row("2", "2024-01-09", "1", "1", "1"),
            tff_row("1", "2024-01-09", "1", "1", "1"),
            tff_row("2", "2024-01-02", "1", "1", "1"),
        ]);
        let panel = normalize(&raw, SourceProgram::Tff, TraderGroup::LeveragedFunds).unwrap();
        let keys: Vec<(&str, u32)> = panel
            .rows()
            .iter()
            .map(|r| (r.key.cftc_code.as_str(), chrono::Datelike::day(&r.date)))
            .collect();
        assert_eq!(keys, vec![("1", 9), ("2", 2), ("2", 9)]);
    }

    #[test]
    fn missing_columns_fail_with_schema_error() {
        let mut row = tff_row("1", "2024-01-02", "1000", "300", "100");
        row.remove(OPEN_INTEREST_COL);
        row.remove("lev_money_positions_short");
        let raw = RawTable::from_rows([row]);

        let err = normalize(&raw, SourceProgram::Tff, TraderGroup::LeveragedFunds).unwrap_err();
        match err {
            CotError::Schema { missing, .. } => {
                assert_eq!(missing, vec![OPEN_INTEREST_COL, "lev_money_positions_short"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn group_must_belong_to_program() {
        let raw = RawTable::new();
        let err = normalize(&raw, SourceProgram::Disaggregated, TraderGroup::Dealer).unwrap_err();
        assert!(matches!(err, CotError::UnsupportedGroup { .. }));
    }

    #[test]
    fn rows_without_date_are_dropped() {
        let raw = RawTable::from_rows([
            tff_row("1", "not a date", "1000", "300", "100"),
            tff_row("1", "2024-01-02", "1000", "300", "100"),
        ]);
        let panel = normalize(&raw, SourceProgram::Tff, TraderGroup::LeveragedFunds).unwrap();
        assert_eq!(panel.len(), 1);
    }

    #[test]
    fn parses_group_and_program_names() {
        assert_eq!("lev_money".parse::<TraderGroup>().unwrap(), TraderGroup::LeveragedFunds);
        assert_eq!("asset_mgr".parse::<TraderGroup>().unwrap(), TraderGroup::AssetManager);
        assert_eq!("DIS".parse::<SourceProgram>().unwrap(), SourceProgram::Disaggregated);
        assert!("cit".parse::<SourceProgram>().is_err());
    }
}
