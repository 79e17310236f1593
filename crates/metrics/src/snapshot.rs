//! Latest observation per series.

use cot_core::{MetricsConfig, Panel, SeriesKey};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Reduces an enriched panel to one row per series: the latest one.
#[derive(Debug, Clone)]
pub struct SnapshotReducer {
    sort_column: Option<String>,
}

impl SnapshotReducer {
    /// Sorts the snapshot descending by `sort_column`.
    pub fn new(sort_column: impl Into<String>) -> Self {
        Self {
            sort_column: Some(sort_column.into()),
        }
    }

    /// Keeps series-key order.
    #[must_use]
    pub fn unsorted() -> Self {
        Self { sort_column: None }
    }

    #[must_use]
    pub fn from_config(config: &MetricsConfig) -> Self {
        Self::new(config.snapshot_sort_column.clone())
    }

    /// Returns exactly one row per series: the one with the greatest date,
    /// the later row in input order on a tie.
    ///
    /// The result is ordered descending by the sort column with undefined
    /// values last; the order is a display default only.
    #[must_use]
    pub fn reduce(&self, panel: &Panel) -> Panel {
        let rows = panel.rows();
        let mut latest: BTreeMap<&SeriesKey, usize> = BTreeMap::new();
        for (i, row) in rows.iter().enumerate() {
            latest
                .entry(&row.key)
                .and_modify(|best| {
                    if row.date >= rows[*best].date {
                        *best = i;
                    }
                })
                .or_insert(i);
        }

        let mut indices: Vec<usize> = latest.into_values().collect();

        match self.sort_column.as_deref() {
            Some(column) if panel.has_column(column) => {
                indices.sort_by(|&a, &b| {
                    descending_undefined_last(panel.value(a, column), panel.value(b, column))
                });
            }
            Some(column) => {
                tracing::warn!(column = %column, "Snapshot sort column not in panel; keeping series order");
            }
            None => {}
        }

        let snapshot = panel.select_rows(&indices);
        tracing::info!(series = snapshot.len(), "Reduced panel to latest snapshot");
        snapshot
    }
}

fn descending_undefined_last(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => y.total_cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use cot_core::RowMeta;

    fn row(code: &str, day: u32) -> RowMeta {
        RowMeta {
            key: SeriesKey::new("TFF", "leveraged_funds", code),
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            market: code.to_string(),
            contract_name: code.to_string(),
            asset_class: None,
        }
    }

    fn panel() -> Panel {
        let mut panel = Panel::new(vec![
            row("A", 2),
            row("A", 9),
            row("B", 9),
            row("C", 16),
            row("B", 2),
            row("C", 16),
        ]);
        panel
            .insert_column(
                "score",
                vec![Some(90.0), Some(10.0), None, Some(1.0), Some(99.0), Some(50.0)],
            )
            .unwrap();
        panel
    }

    #[test]
    fn keeps_latest_row_per_series() {
        let snapshot = SnapshotReducer::unsorted().reduce(&panel());
        assert_eq!(snapshot.len(), 3);
        let scores = snapshot.values("score").unwrap();
        // A latest = day 9, B latest = day 9 (row 2 despite row order), C tie -> later row
        assert_eq!(scores, &[Some(10.0), None, Some(50.0)]);
    }

    #[test]
    fn sorts_descending_with_undefined_last() {
        let snapshot = SnapshotReducer::new("score").reduce(&panel());
        let codes: Vec<&str> = snapshot
            .rows()
            .iter()
            .map(|r| r.key.cftc_code.as_str())
            .collect();
        assert_eq!(codes, vec!["C", "A", "B"]);
    }

    #[test]
    fn missing_sort_column_keeps_series_order() {
        let snapshot = SnapshotReducer::new("nope").reduce(&panel());
        let codes: Vec<&str> = snapshot
            .rows()
            .iter()
            .map(|r| r.key.cftc_code.as_str())
            .collect();
        assert_eq!(codes, vec!["A", "B", "C"]);
    }
}
