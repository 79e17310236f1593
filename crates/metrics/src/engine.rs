//! Metrics engine: change, score and score-change columns for a whole panel.
//!
//! The panel is partitioned by series identity, each series is processed
//! as an independent date-ordered slice, and results are scattered back by
//! row index. No window ever spans two series.

use crate::rolling::{self, WindowPolicy};
use cot_core::columns::{change_column, score_column};
use cot_core::{CotError, MetricsConfig, Panel, SeriesKey, Statistic};

type Partitions = [(SeriesKey, Vec<usize>)];

pub struct MetricsEngine {
    config: MetricsConfig,
    policies: Vec<WindowPolicy>,
}

impl MetricsEngine {
    #[must_use]
    pub fn new(config: MetricsConfig) -> Self {
        let policies = WindowPolicy::from_config(&config);
        Self { config, policies }
    }

    #[must_use]
    pub fn config(&self) -> &MetricsConfig {
        &self.config
    }

    #[must_use]
    pub fn policies(&self) -> &[WindowPolicy] {
        &self.policies
    }

    /// Computes the enriched panel.
    ///
    /// The output is the input sorted by (dataset, group, contract code, date)
    /// with derived columns appended. Expressions and change bases missing
    /// from the input are skipped.
    ///
    /// # Errors
    /// Only fails if a derived column cannot be attached, which indicates a bug.
    pub fn compute(&self, panel: &Panel) -> Result<Panel, CotError> {
        let mut out = panel.sorted_by_series();
        let partitions = out.series_partitions();
        warn_on_duplicate_dates(&out, &partitions);

        let mut derived: Vec<(String, Vec<Option<f64>>)> = Vec::new();

        for base in &self.config.change_bases {
            let Some(values) = out.values(base) else {
                tracing::debug!(column = %base, "Change base not in panel; skipping");
                continue;
            };
            for horizon in &self.config.horizons {
                let changes = per_series(&partitions, values, |series| {
                    rolling::diff(series, horizon.periods())
                });
                derived.push((change_column(base, *horizon), changes));
            }
        }

        for expression in &self.config.expressions {
            let Some(values) = out.values(expression) else {
                tracing::debug!(expression = %expression, "Expression not in panel; skipping");
                continue;
            };
            for policy in &self.policies {
                for statistic in Statistic::ALL {
                    let scores = per_series(&partitions, values, |series| {
                        rolling::score(series, statistic, policy)
                    });
                    let name = score_column(expression, statistic, policy.tag());

                    if self.config.include_score_changes {
                        for horizon in &self.config.horizons {
                            let changes = per_series(&partitions, &scores, |series| {
                                rolling::diff(series, horizon.periods())
                            });
                            derived.push((change_column(&name, *horizon), changes));
                        }
                    }
                    derived.push((name, scores));
                }
            }
        }

        let added = derived.len();
        for (name, values) in derived {
            out.insert_column(name, values)?;
        }

        tracing::info!(
            rows = out.len(),
            series = partitions.len(),
            columns_added = added,
            "Computed positioning metrics"
        );
        Ok(out)
    }
}

impl Default for MetricsEngine {
    fn default() -> Self {
        Self::new(MetricsConfig::default())
    }
}

/// Applies a single-series transform to every partition and reassembles
/// the results in panel row order.
fn per_series<F>(partitions: &Partitions, values: &[Option<f64>], transform: F) -> Vec<Option<f64>>
where
    F: Fn(&[Option<f64>]) -> Vec<Option<f64>>,
{
    let mut out = vec![None; values.len()];
    let mut series = Vec::new();
    for (_, indices) in partitions {
        series.clear();
        series.extend(indices.iter().map(|&i| values[i]));
        for (&i, value) in indices.iter().zip(transform(&series)) {
            out[i] = value;
        }
    }
    out
}

fn warn_on_duplicate_dates(panel: &Panel, partitions: &Partitions) {
    let rows = panel.rows();
    for (key, indices) in partitions {
        let duplicates = indices
            .windows(2)
            .filter(|pair| rows[pair[0]].date == rows[pair[1]].date)
            .count();
        if duplicates > 0 {
            tracing::warn!(series = %key, duplicates, "Series has repeated report dates");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};
    use cot_core::columns::{score_change_column, NET, PCT_OI_NET};
    use cot_core::{Horizon, RowMeta, WindowSpec};

    fn series_panel(code: &str, values: &[f64]) -> Panel {
        let start = NaiveDate::from_ymd_opt(2020, 1, 7).unwrap();
        let rows = (0..values.len())
            .map(|i| RowMeta {
                key: SeriesKey::new("TFF", "leveraged_funds", code),
                date: start + Duration::weeks(i as i64),
                market: format!("{code} - EXCHANGE"),
                contract_name: code.to_string(),
                asset_class: None,
            })
            .collect();
        let mut panel = Panel::new(rows);
        panel
            .insert_column(NET, values.iter().copied().map(Some).collect())
            .unwrap();
        panel
    }

    fn small_config() -> MetricsConfig {
        MetricsConfig {
            windows: vec![WindowSpec::new("3w", 3)],
            expanding: cot_core::ExpandingSpec {
                tag: "max".to_string(),
                min_periods: 2,
            },
            expressions: vec![NET.to_string(), PCT_OI_NET.to_string()],
            change_bases: vec![NET.to_string(), "spreading".to_string()],
            horizons: vec![Horizon(1), Horizon(2)],
            include_score_changes: true,
            snapshot_sort_column: "net_pctile_3w".to_string(),
        }
    }

    #[test]
    fn produces_named_columns_and_skips_absent_inputs() {
        let engine = MetricsEngine::new(small_config());
        let out = engine.compute(&series_panel("A", &[1.0, 2.0, 3.0, 4.0])).unwrap();

        assert!(out.has_column("net_chg_1w"));
        assert!(out.has_column("net_chg_2w"));
        assert!(!out.has_column("spreading_chg_1w"));
        for window in ["3w", "max"] {
            for statistic in Statistic::ALL {
                assert!(out.has_column(&score_column(NET, statistic, window)));
                assert!(out.has_column(&score_change_column(NET, statistic, window, Horizon(1))));
                assert!(!out.has_column(&score_column(PCT_OI_NET, statistic, window)));
            }
        }
    }

    #[test]
    fn score_changes_can_be_disabled() {
        let mut config = small_config();
        config.include_score_changes = false;
        let out = MetricsEngine::new(config)
            .compute(&series_panel("A", &[1.0, 2.0, 3.0]))
            .unwrap();
        assert!(out.has_column("net_pctile_3w"));
        assert!(!out.has_column("net_pctile_3w_chg_1w"));
    }

    #[test]
    fn score_change_is_difference_of_scores() {
        let engine = MetricsEngine::new(small_config());
        let out = engine
            .compute(&series_panel("A", &[5.0, 1.0, 3.0, 2.0, 8.0]))
            .unwrap();
        let scores = out.values("net_minmax_max").unwrap();
        let changes = out.values("net_minmax_max_chg_1w").unwrap();
        for i in 1..scores.len() {
            let expected = match (scores[i], scores[i - 1]) {
                (Some(a), Some(b)) => Some(a - b),
                _ => None,
            };
            assert_eq!(changes[i], expected, "row {i}");
        }
    }

    #[test]
    fn series_never_share_a_window() {
        let engine = MetricsEngine::new(small_config());
        let a = series_panel("A", &[1.0, 2.0]);
        let b = series_panel("B", &[10.0, 20.0, 30.0]);
        let out = engine.compute(&Panel::concat([a, b])).unwrap();

        // A has two rows: too short for the 3-row window, even though B follows it
        let fixed = out.values("net_pctile_3w").unwrap();
        assert_eq!(&fixed[..2], &[None, None]);
        assert_eq!(&fixed[2..], &[None, None, Some(100.0)]);

        let chg = out.values("net_chg_1w").unwrap();
        assert_eq!(chg[2], None, "first row of B must not diff against A");
    }

    #[test]
    fn output_is_sorted_by_series_then_date() {
        let engine = MetricsEngine::new(small_config());
        let b = series_panel("B", &[1.0, 2.0]);
        let a = series_panel("A", &[3.0, 4.0]);
        let reversed = a.select_rows(&[1, 0]);
        let out = engine.compute(&Panel::concat([b, reversed])).unwrap();

        let order: Vec<(&str, f64)> = out
            .rows()
            .iter()
            .zip(out.values(NET).unwrap())
            .map(|(r, v)| (r.key.cftc_code.as_str(), v.unwrap()))
            .collect();
        assert_eq!(order, vec![("A", 3.0), ("A", 4.0), ("B", 1.0), ("B", 2.0)]);
    }
}
