//! Single-series window statistics.
//!
//! Every function here takes the values of one series in date order and
//! returns one output per input. Output at index `i` depends only on
//! inputs `0..=i`.

use cot_core::value::{finite, sub};
use cot_core::{ExpandingSpec, MetricsConfig, Statistic, WindowSpec};
use std::fmt;

/// How far back a score looks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WindowPolicy {
    /// The last `periods` rows, all of which must be defined.
    Fixed { tag: String, periods: usize },
    /// All rows so far, once at least `min_periods` of them are defined.
    Expanding { tag: String, min_periods: usize },
}

impl WindowPolicy {
    #[must_use]
    pub fn tag(&self) -> &str {
        match self {
            WindowPolicy::Fixed { tag, .. } | WindowPolicy::Expanding { tag, .. } => tag,
        }
    }

    /// The configured fixed windows followed by the expanding window.
    #[must_use]
    pub fn from_config(config: &MetricsConfig) -> Vec<WindowPolicy> {
        config
            .windows
            .iter()
            .map(WindowPolicy::from)
            .chain(std::iter::once(WindowPolicy::from(&config.expanding)))
            .collect()
    }
}

impl From<&WindowSpec> for WindowPolicy {
    fn from(window: &WindowSpec) -> Self {
        WindowPolicy::Fixed {
            tag: window.tag.clone(),
            periods: window.periods,
        }
    }
}

impl From<&ExpandingSpec> for WindowPolicy {
    fn from(expanding: &ExpandingSpec) -> Self {
        WindowPolicy::Expanding {
            tag: expanding.tag.clone(),
            min_periods: expanding.min_periods,
        }
    }
}

impl fmt::Display for WindowPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WindowPolicy::Fixed { tag, periods } => write!(f, "{tag} ({periods} periods)"),
            WindowPolicy::Expanding { tag, min_periods } => {
                write!(f, "{tag} (expanding, floor {min_periods})")
            }
        }
    }
}

/// Backward difference `value[i] - value[i - periods]`.
///
/// Undefined for the first `periods` rows and wherever either operand is undefined.
#[must_use]
pub fn diff(values: &[Option<f64>], periods: usize) -> Vec<Option<f64>> {
    values
        .iter()
        .enumerate()
        .map(|(i, &current)| {
            if i < periods {
                None
            } else {
                sub(current, values[i - periods])
            }
        })
        .collect()
}

/// Share of `window` at or below `current`, 0-100. Ties count as at-or-below.
#[must_use]
pub fn percentile_rank(window: &[f64], current: f64) -> Option<f64> {
    if window.is_empty() {
        return None;
    }
    let at_or_below = window.iter().filter(|&&x| x <= current).count();
    finite(at_or_below as f64 / window.len() as f64 * 100.0)
}

/// Position of `current` between `min` and `max`, 0-100. Undefined when `max == min`.
#[must_use]
pub fn min_max_position(current: f64, min: f64, max: f64) -> Option<f64> {
    let range = max - min;
    if range <= 0.0 {
        return None;
    }
    finite((current - min) / range * 100.0)
}

/// `(current - mean) / std`. Undefined when `std` is not positive.
#[must_use]
pub fn z_score(current: f64, mean: f64, std: f64) -> Option<f64> {
    if std <= 0.0 {
        return None;
    }
    finite((current - mean) / std)
}

/// Population mean and standard deviation of a non-empty window.
fn mean_std(window: &[f64]) -> (f64, f64) {
    let n = window.len() as f64;
    let mean = window.iter().sum::<f64>() / n;
    let variance = window.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
    (mean, variance.sqrt())
}

fn window_score(window: &[f64], current: f64, statistic: Statistic) -> Option<f64> {
    let (min, max) = window
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &x| {
            (lo.min(x), hi.max(x))
        });
    match statistic {
        Statistic::Percentile => percentile_rank(window, current),
        Statistic::MinMax => min_max_position(current, min, max),
        Statistic::ZScore => {
            // a constant window has no spread, whatever rounding says
            if max == min {
                return None;
            }
            let (mean, std) = mean_std(window);
            z_score(current, mean, std)
        }
    }
}

/// Score over a trailing window of `periods` rows ending at each row.
///
/// Rows `0..periods - 1` are undefined, as is any row whose window holds an
/// undefined value.
#[must_use]
pub fn rolling_score(values: &[Option<f64>], statistic: Statistic, periods: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; values.len()];
    if periods == 0 {
        return out;
    }

    let mut window: Vec<f64> = Vec::with_capacity(periods);
    for end in (periods - 1)..values.len() {
        window.clear();
        window.extend(values[end + 1 - periods..=end].iter().flatten());
        if window.len() < periods {
            continue;
        }
        out[end] = window_score(&window, window[periods - 1], statistic);
    }
    out
}

/// Running state of an expanding window over the defined values seen so far.
#[derive(Debug, Clone)]
struct ExpandingState {
    sorted: Vec<f64>,
    min: f64,
    max: f64,
    mean: f64,
    m2: f64,
}

impl ExpandingState {
    fn new() -> Self {
        Self {
            sorted: Vec::new(),
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
            mean: 0.0,
            m2: 0.0,
        }
    }

    fn count(&self) -> usize {
        self.sorted.len()
    }

    fn push(&mut self, x: f64) {
        let at = self.sorted.partition_point(|&v| v <= x);
        self.sorted.insert(at, x);
        self.min = self.min.min(x);
        self.max = self.max.max(x);

        // Welford
        let n = self.sorted.len() as f64;
        let delta = x - self.mean;
        self.mean += delta / n;
        self.m2 += delta * (x - self.mean);
    }

    fn score(&self, current: f64, statistic: Statistic) -> Option<f64> {
        let n = self.count();
        if n == 0 {
            return None;
        }
        match statistic {
            Statistic::Percentile => {
                let at_or_below = self.sorted.partition_point(|&v| v <= current);
                finite(at_or_below as f64 / n as f64 * 100.0)
            }
            Statistic::MinMax => min_max_position(current, self.min, self.max),
            Statistic::ZScore => {
                if self.max == self.min {
                    return None;
                }
                let std = (self.m2 / n as f64).max(0.0).sqrt();
                z_score(current, self.mean, std)
            }
        }
    }
}

/// Score over all rows up to and including each row.
///
/// Undefined values in the history are ignored. A row is scored when its
/// own value is defined and at least `min_periods` defined values (itself
/// included) have been seen.
#[must_use]
pub fn expanding_score(
    values: &[Option<f64>],
    statistic: Statistic,
    min_periods: usize,
) -> Vec<Option<f64>> {
    let floor = min_periods.max(1);
    let mut state = ExpandingState::new();
    values
        .iter()
        .map(|&value| {
            let current = value?;
            state.push(current);
            if state.count() < floor {
                return None;
            }
            state.score(current, statistic)
        })
        .collect()
}

/// Score of one series under a window policy.
#[must_use]
pub fn score(values: &[Option<f64>], statistic: Statistic, policy: &WindowPolicy) -> Vec<Option<f64>> {
    match policy {
        WindowPolicy::Fixed { periods, .. } => rolling_score(values, statistic, *periods),
        WindowPolicy::Expanding { min_periods, .. } => {
            expanding_score(values, statistic, *min_periods)
        }
    }
}
