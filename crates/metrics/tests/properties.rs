use chrono::{Duration, NaiveDate};
use cot_core::columns::{change_column, score_column, NET};
use cot_core::{ExpandingSpec, Horizon, MetricsConfig, Panel, RowMeta, SeriesKey, Statistic, WindowSpec};
use cot_metrics::rolling::{self, WindowPolicy};
use cot_metrics::MetricsEngine;

const EPS: f64 = 1e-9;

fn series_rows(code: &str, len: usize) -> Vec<RowMeta> {
    let start = NaiveDate::from_ymd_opt(2019, 1, 1).unwrap();
    (0..len)
        .map(|i| RowMeta {
            key: SeriesKey::new("DIS", "managed_money", code),
            date: start + Duration::weeks(i as i64),
            market: format!("{code} - TEST EXCHANGE"),
            contract_name: code.to_string(),
            asset_class: Some("Commodities".to_string()),
        })
        .collect()
}

fn wave(len: usize, phase: f64) -> Vec<f64> {
    (0..len).map(|i| (i as f64 * 0.7 + phase).sin() * 100.0 + i as f64).collect()
}

fn config() -> MetricsConfig {
    MetricsConfig {
        windows: vec![WindowSpec::new("8w", 8)],
        expanding: ExpandingSpec {
            tag: "max".to_string(),
            min_periods: 5,
        },
        expressions: vec![NET.to_string()],
        change_bases: vec![NET.to_string()],
        horizons: vec![Horizon(1), Horizon(4)],
        include_score_changes: true,
        snapshot_sort_column: "net_pctile_8w".to_string(),
    }
}

fn assert_close(a: Option<f64>, b: Option<f64>) {
    match (a, b) {
        (Some(x), Some(y)) => assert!((x - y).abs() < EPS, "{x} != {y}"),
        (None, None) => {}
        _ => panic!("definedness differs: {a:?} vs {b:?}"),
    }
}

#[test]
fn interleaved_series_score_like_isolated_ones() {
    let a_values = wave(30, 0.0);
    let b_values = wave(30, 1.3);

    let mut a = Panel::new(series_rows("A", 30));
    a.insert_column(NET, a_values.iter().copied().map(Some).collect()).unwrap();
    let mut b = Panel::new(series_rows("B", 30));
    b.insert_column(NET, b_values.iter().copied().map(Some).collect()).unwrap();

    // alternate rows of the two series
    let mut rows = Vec::new();
    let mut net = Vec::new();
    for i in 0..30 {
        rows.push(a.rows()[i].clone());
        net.push(Some(a_values[i]));
        rows.push(b.rows()[i].clone());
        net.push(Some(b_values[i]));
    }
    let mut interleaved = Panel::new(rows);
    interleaved.insert_column(NET, net).unwrap();

    let engine = MetricsEngine::new(config());
    let isolated = Panel::concat([engine.compute(&a).unwrap(), engine.compute(&b).unwrap()]);
    let mixed = engine.compute(&interleaved).unwrap();

    assert_eq!(isolated.len(), mixed.len());
    for name in isolated.column_names() {
        let left = isolated.values(name).unwrap();
        let right = mixed.values(name).unwrap();
        for (x, y) in left.iter().zip(right) {
            assert_close(*x, *y);
        }
    }
}

#[test]
fn changes_telescope() {
    let values: Vec<Option<f64>> = wave(20, 0.4).into_iter().map(Some).collect();
    let one = rolling::diff(&values, 1);
    let four = rolling::diff(&values, 4);

    for i in 0..4 {
        assert!(four[i].is_none());
    }
    for i in 4..values.len() {
        let summed: f64 = (i - 3..=i).map(|j| one[j].unwrap()).sum();
        assert!((summed - four[i].unwrap()).abs() < EPS);
    }
}

#[test]
fn fixed_window_warmup_rows_are_undefined() {
    let values: Vec<Option<f64>> = wave(20, 0.0).into_iter().map(Some).collect();
    for statistic in Statistic::ALL {
        let scores = rolling::rolling_score(&values, statistic, 8);
        assert!(scores[..7].iter().all(Option::is_none));
        assert!(scores[7..].iter().all(Option::is_some), "{statistic}");
    }
}

#[test]
fn percentile_is_monotonic_and_tops_out_at_window_max() {
    let window = [3.0, -1.0, 7.5, 2.0, 7.5, 0.0];
    let mut previous = 0.0;
    for step in -20..=20 {
        let current = f64::from(step) * 0.5;
        let rank = rolling::percentile_rank(&window, current).unwrap();
        assert!(rank >= previous);
        previous = rank;
    }
    assert_eq!(rolling::percentile_rank(&window, 7.5), Some(100.0));
}

#[test]
fn min_max_spans_zero_to_hundred() {
    let values: Vec<Option<f64>> = [4.0, 9.0, 1.0, 6.0, 9.0, 2.0, 1.0]
        .into_iter()
        .map(Some)
        .collect();
    let scores = rolling::rolling_score(&values, Statistic::MinMax, 3);
    // windows ending at 4: [1, 6, 9] -> 100, at 6: [9, 2, 1] -> 0
    assert_eq!(scores[4], Some(100.0));
    assert_eq!(scores[6], Some(0.0));
}

#[test]
fn expanding_z_respects_floor_and_peaks_at_newest_high() {
    let values: Vec<Option<f64>> = (1..=53).map(|v| Some(f64::from(v))).collect();
    let policy = WindowPolicy::Expanding {
        tag: "max".to_string(),
        min_periods: 52,
    };
    let z = rolling::score(&values, Statistic::ZScore, &policy);

    assert!(z[..51].iter().all(Option::is_none));
    let at_floor = z[51].unwrap();
    let last = z[52].unwrap();
    assert!(last > 0.0);
    assert!(last > at_floor);
}

#[test]
fn expanding_history_ignores_gaps() {
    let values = vec![Some(1.0), None, Some(3.0), Some(2.0)];
    let pct = rolling::expanding_score(&values, Statistic::Percentile, 2);
    assert_eq!(pct[0], None);
    assert_eq!(pct[1], None);
    assert_eq!(pct[2], Some(100.0));
    // 2.0 against {1, 3, 2}
    assert!((pct[3].unwrap() - 200.0 / 3.0).abs() < EPS);
}

#[test]
fn engine_columns_match_single_series_functions() {
    let values = wave(25, 2.0);
    let mut panel = Panel::new(series_rows("X", 25));
    panel.insert_column(NET, values.iter().copied().map(Some).collect()).unwrap();

    let out = MetricsEngine::new(config()).compute(&panel).unwrap();
    let input: Vec<Option<f64>> = values.into_iter().map(Some).collect();

    let expected = rolling::rolling_score(&input, Statistic::ZScore, 8);
    for (got, want) in out.values(&score_column(NET, Statistic::ZScore, "8w")).unwrap().iter().zip(&expected) {
        assert_close(*got, *want);
    }

    let expected = rolling::diff(&input, 4);
    for (got, want) in out.values(&change_column(NET, Horizon(4))).unwrap().iter().zip(&expected) {
        assert_close(*got, *want);
    }
}
