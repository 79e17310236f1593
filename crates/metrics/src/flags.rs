//! Crowding labels for a single snapshot row.

use cot_core::Statistic;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Flag {
    ExtremeLong,
    ExtremeShort,
    BigWeeklyMove,
}

impl Flag {
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Flag::ExtremeLong => "extreme long",
            Flag::ExtremeShort => "extreme short",
            Flag::BigWeeklyMove => "big weekly move",
        }
    }
}

impl fmt::Display for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Cut-offs for [`evaluate`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FlagThresholds {
    /// Percentile and min-max scores at or above this are extreme long.
    pub bounded_high: f64,
    /// Percentile and min-max scores at or below this are extreme short.
    pub bounded_low: f64,
    /// Absolute z-score at or beyond which a position is extreme.
    pub z_extreme: f64,
    /// Absolute 1-week change in `pct_oi_net`.
    pub weekly_move: f64,
}

impl Default for FlagThresholds {
    fn default() -> Self {
        Self {
            bounded_high: 90.0,
            bounded_low: 10.0,
            z_extreme: 2.0,
            weekly_move: 0.02,
        }
    }
}

impl FlagThresholds {
    fn extreme(&self, statistic: Statistic, score: f64) -> Option<Flag> {
        let (high, low) = match statistic {
            Statistic::Percentile | Statistic::MinMax => (self.bounded_high, self.bounded_low),
            Statistic::ZScore => (self.z_extreme, -self.z_extreme),
        };
        if score >= high {
            Some(Flag::ExtremeLong)
        } else if score <= low {
            Some(Flag::ExtremeShort)
        } else {
            None
        }
    }
}

/// Labels a row from its selected score and its 1-week `pct_oi_net` change.
/// Undefined inputs never raise a flag.
#[must_use]
pub fn evaluate(
    statistic: Statistic,
    score: Option<f64>,
    pct_oi_net_weekly_change: Option<f64>,
    thresholds: &FlagThresholds,
) -> Vec<Flag> {
    let mut flags = Vec::new();
    if let Some(flag) = score.and_then(|s| thresholds.extreme(statistic, s)) {
        flags.push(flag);
    }
    if pct_oi_net_weekly_change.is_some_and(|c| c.abs() >= thresholds.weekly_move) {
        flags.push(Flag::BigWeeklyMove);
    }
    flags
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounded_scores_use_deciles() {
        let t = FlagThresholds::default();
        assert_eq!(evaluate(Statistic::Percentile, Some(90.0), None, &t), vec![Flag::ExtremeLong]);
        assert_eq!(evaluate(Statistic::MinMax, Some(10.0), None, &t), vec![Flag::ExtremeShort]);
        assert!(evaluate(Statistic::Percentile, Some(50.0), None, &t).is_empty());
    }

    #[test]
    fn z_scores_use_two_sigma() {
        let t = FlagThresholds::default();
        assert_eq!(evaluate(Statistic::ZScore, Some(2.5), None, &t), vec![Flag::ExtremeLong]);
        assert_eq!(evaluate(Statistic::ZScore, Some(-2.0), None, &t), vec![Flag::ExtremeShort]);
        assert!(evaluate(Statistic::ZScore, Some(1.5), None, &t).is_empty());
    }

    #[test]
    fn weekly_move_is_absolute() {
        let t = FlagThresholds::default();
        assert_eq!(
            evaluate(Statistic::Percentile, Some(95.0), Some(-0.03), &t),
            vec![Flag::ExtremeLong, Flag::BigWeeklyMove]
        );
        assert!(evaluate(Statistic::Percentile, None, Some(0.01), &t).is_empty());
    }
}
