//! Column naming for the metrics and snapshot tables.
//!
//! Consumers build column names from (expression, statistic, window, horizon)
//! with these functions instead of enumerating them:
//!
//! - `{base}_chg_{h}w` for raw changes, e.g. `net_chg_4w`
//! - `{expr}_{stat}_{window}` for scores, e.g. `pct_oi_net_pctile_5y`
//! - `{expr}_{stat}_{window}_chg_{h}w` for score changes

use crate::error::CotError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const LONG: &str = "long";
pub const SHORT: &str = "short";
pub const SPREADING: &str = "spreading";
pub const NET: &str = "net";
pub const OPEN_INTEREST: &str = "open_interest";
pub const PCT_OI_NET: &str = "pct_oi_net";
pub const PCT_OI_LONG: &str = "pct_oi_long";
pub const PCT_OI_SHORT: &str = "pct_oi_short";

/// Numeric columns produced by the normalizer, in output order.
pub const TIDY_NUMERIC: [&str; 8] = [
    OPEN_INTEREST,
    LONG,
    SHORT,
    SPREADING,
    NET,
    PCT_OI_NET,
    PCT_OI_LONG,
    PCT_OI_SHORT,
];

/// Score family computed over a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Statistic {
    /// Inclusive percentile rank, 0-100.
    #[serde(rename = "pctile")]
    Percentile,
    /// Position between window min and max, 0-100.
    MinMax,
    /// Standard score with population standard deviation.
    #[serde(rename = "z")]
    ZScore,
}

impl Statistic {
    pub const ALL: [Statistic; 3] = [Statistic::Percentile, Statistic::MinMax, Statistic::ZScore];

    #[must_use]
    pub fn tag(&self) -> &'static str {
        match self {
            Statistic::Percentile => "pctile",
            Statistic::MinMax => "minmax",
            Statistic::ZScore => "z",
        }
    }
}

impl fmt::Display for Statistic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for Statistic {
    type Err = CotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pctile" | "percentile" => Ok(Statistic::Percentile),
            "minmax" | "min-max" => Ok(Statistic::MinMax),
            "z" | "zscore" | "z-score" => Ok(Statistic::ZScore),
            _ => Err(CotError::UnknownStatistic(s.to_string())),
        }
    }
}

/// Change horizon in report periods (weeks).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Horizon(pub usize);

impl Horizon {
    pub const DEFAULTS: [Horizon; 3] = [Horizon(1), Horizon(4), Horizon(13)];

    #[must_use]
    pub fn periods(&self) -> usize {
        self.0
    }

    #[must_use]
    pub fn tag(&self) -> String {
        format!("{}w", self.0)
    }
}

impl FromStr for Horizon {
    type Err = std::num::ParseIntError;

    /// Accepts `4` or `4w`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.trim().trim_end_matches(['w', 'W']);
        digits.parse().map(Horizon)
    }
}

#[must_use]
pub fn change_column(base: &str, horizon: Horizon) -> String {
    format!("{base}_chg_{}", horizon.tag())
}

#[must_use]
pub fn score_column(expression: &str, statistic: Statistic, window: &str) -> String {
    format!("{expression}_{}_{window}", statistic.tag())
}

#[must_use]
pub fn score_change_column(
    expression: &str,
    statistic: Statistic,
    window: &str,
    horizon: Horizon,
) -> String {
    change_column(&score_column(expression, statistic, window), horizon)
}
