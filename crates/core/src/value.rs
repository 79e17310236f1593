//! Arithmetic over possibly-undefined values.
//!
//! Every statistic in the pipeline is an `Option<f64>`. `None` is the
//! undefined marker and any undefined operand yields an undefined result.
//! NaN and infinities are never stored; they are converted to `None` here.

/// Converts a raw float into a defined value, rejecting NaN and infinities.
#[inline]
#[must_use]
pub fn finite(x: f64) -> Option<f64> {
    x.is_finite().then_some(x)
}

/// Parses a numeric cell. Empty, unparseable and non-finite input is undefined.
#[must_use]
pub fn parse_numeric(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().and_then(finite)
}

#[inline]
#[must_use]
pub fn sub(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    finite(a? - b?)
}

/// Divides `a` by `b`, undefined when `b` is zero or either side is undefined.
#[inline]
#[must_use]
pub fn div(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    let denom = b?;
    if denom == 0.0 {
        return None;
    }
    finite(a? / denom)
}

/// `position / open_interest`, defined only for strictly positive open interest.
#[inline]
#[must_use]
pub fn share_of(position: Option<f64>, open_interest: Option<f64>) -> Option<f64> {
    match open_interest {
        Some(oi) if oi > 0.0 => div(position, Some(oi)),
        _ => None,
    }
}
