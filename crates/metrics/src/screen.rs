#![allow(clippy::format_push_string)]

use crate::flags::{self, Flag, FlagThresholds};
use chrono::NaiveDate;
use cot_core::columns::{change_column, score_change_column, score_column, PCT_OI_NET};
use cot_core::{Horizon, Panel, SeriesKey, Statistic};

/// Which score to read from a snapshot, and for which sector.
#[derive(Debug, Clone)]
pub struct ScreenQuery {
    /// Case-insensitive asset class label; `None` screens every row.
    pub asset_class: Option<String>,
    pub expression: String,
    pub statistic: Statistic,
    pub window: String,
    pub horizon: Horizon,
}

impl ScreenQuery {
    #[must_use]
    pub fn score_column(&self) -> String {
        score_column(&self.expression, self.statistic, &self.window)
    }

    #[must_use]
    pub fn change_column(&self) -> String {
        score_change_column(&self.expression, self.statistic, &self.window, self.horizon)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScreenRow {
    pub key: SeriesKey,
    pub market: String,
    pub date: NaiveDate,
    pub score: Option<f64>,
    pub score_change: Option<f64>,
    pub flags: Vec<Flag>,
}

/// Selects the snapshot rows matching the query, in snapshot order.
#[must_use]
pub fn screen(snapshot: &Panel, query: &ScreenQuery, thresholds: &FlagThresholds) -> Vec<ScreenRow> {
    let score_col = query.score_column();
    let change_col = query.change_column();
    let weekly_col = change_column(PCT_OI_NET, Horizon(1));

    if !snapshot.has_column(&score_col) {
        tracing::warn!(column = %score_col, "Score column not in snapshot");
    }

    snapshot
        .rows()
        .iter()
        .enumerate()
        .filter(|(_, row)| match &query.asset_class {
            Some(class) => row
                .asset_class
                .as_deref()
                .is_some_and(|c| c.eq_ignore_ascii_case(class)),
            None => true,
        })
        .map(|(i, row)| {
            let score = snapshot.value(i, &score_col);
            ScreenRow {
                key: row.key.clone(),
                market: row.market.clone(),
                date: row.date,
                score,
                score_change: snapshot.value(i, &change_col),
                flags: flags::evaluate(
                    query.statistic,
                    score,
                    snapshot.value(i, &weekly_col),
                    thresholds,
                ),
            }
        })
        .collect()
}

pub struct ScreenFormatter;

impl ScreenFormatter {
    #[must_use]
    pub fn format(query: &ScreenQuery, rows: &[ScreenRow]) -> String {
        let mut output = String::new();
        let sector = query.asset_class.as_deref().unwrap_or("All");

        output.push('\n');
        output.push_str("═══════════════════════════════════════════════════════════════════════════════\n");
        output.push_str(&format!("  POSITIONING SCREEN: {sector}\n"));
        output.push_str("═══════════════════════════════════════════════════════════════════════════════\n");
        output.push_str(&format!(
            "Score:   {}\nChange:  {}\n",
            query.score_column(),
            query.change_column()
        ));
        output.push_str("───────────────────────────────────────────────────────────────────────────────\n");
        output.push_str(&format!(
            "{:<40} {:<10} {:<5} {:>9} {:>9}  {}\n",
            "Market", "Date", "Group", "Score", "Change", "Flags"
        ));
        output.push_str("───────────────────────────────────────────────────────────────────────────────\n");

        for row in rows {
            let flags = row
                .flags
                .iter()
                .map(Flag::label)
                .collect::<Vec<_>>()
                .join(", ");
            output.push_str(&format!(
                "{:<40} {:<10} {:<5} {:>9} {:>9}  {}\n",
                truncate(&row.market, 40),
                row.date.format("%Y-%m-%d"),
                group_abbrev(&row.key.group),
                fmt_value(row.score),
                fmt_value(row.score_change),
                flags
            ));
        }

        output.push_str("═══════════════════════════════════════════════════════════════════════════════\n");

        if rows.is_empty() {
            output.push_str("\nNo markets matched this screen.\n\n");
        }

        output
    }
}

fn fmt_value(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{v:.2}"))
}

fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        s.chars().take(width - 1).chain(std::iter::once('…')).collect()
    }
}

fn group_abbrev(group: &str) -> &str {
    match group {
        "leveraged_funds" => "LF",
        "asset_manager" => "AM",
        "managed_money" => "MM",
        "dealer" => "DLR",
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cot_core::RowMeta;

    fn snapshot() -> Panel {
        let row = |code: &str, class: Option<&str>| RowMeta {
            key: SeriesKey::new("TFF", "leveraged_funds", code),
            date: NaiveDate::from_ymd_opt(2024, 6, 4).unwrap(),
            market: format!("{code} - CHICAGO MERCANTILE EXCHANGE"),
            contract_name: code.to_string(),
            asset_class: class.map(str::to_string),
        };
        let mut panel = Panel::new(vec![
            row("ES", Some("Equities")),
            row("NQ", Some("Equities")),
            row("ZN", Some("Rates")),
        ]);
        panel
            .insert_column("pct_oi_net_pctile_5y", vec![Some(95.0), Some(40.0), Some(5.0)])
            .unwrap();
        panel
            .insert_column("pct_oi_net_pctile_5y_chg_4w", vec![Some(12.0), None, Some(-3.0)])
            .unwrap();
        panel
            .insert_column("pct_oi_net_chg_1w", vec![Some(0.001), Some(0.05), None])
            .unwrap();
        panel
    }

    fn query(asset_class: Option<&str>) -> ScreenQuery {
        ScreenQuery {
            asset_class: asset_class.map(str::to_string),
            expression: PCT_OI_NET.to_string(),
            statistic: Statistic::Percentile,
            window: "5y".to_string(),
            horizon: Horizon(4),
        }
    }

    #[test]
    fn filters_by_asset_class_and_flags_rows() {
        let rows = screen(&snapshot(), &query(Some("equities")), &FlagThresholds::default());
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].key.cftc_code, "ES");
        assert_eq!(rows[0].score, Some(95.0));
        assert_eq!(rows[0].score_change, Some(12.0));
        assert_eq!(rows[0].flags, vec![Flag::ExtremeLong]);
        assert_eq!(rows[1].flags, vec![Flag::BigWeeklyMove]);
    }

    #[test]
    fn formatter_lists_every_row() {
        let q = query(None);
        let rows = screen(&snapshot(), &q, &FlagThresholds::default());
        let text = ScreenFormatter::format(&q, &rows);
        assert!(text.contains("POSITIONING SCREEN: All"));
        assert!(text.contains("pct_oi_net_pctile_5y_chg_4w"));
        assert!(text.contains("extreme short"));
        assert!(text.contains("n/a"));
    }

    #[test]
    fn formatter_notes_empty_screen() {
        let q = query(Some("Crypto"));
        let rows = screen(&snapshot(), &q, &FlagThresholds::default());
        assert!(ScreenFormatter::format(&q, &rows).contains("No markets matched"));
    }
}
