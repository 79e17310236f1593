//! Reconciliation of curated short market names against API names.
//!
//! Both sides are normalized (uppercase, runs of punctuation and whitespace
//! collapsed to one space). A [`NameMatcher`] strategy then picks the catalog
//! entry: [`ExactMatcher`] for deterministic, auditable mappings and
//! [`FuzzyMatcher`] which falls back to the most similar entry above a floor.
//! No match is `None`; callers skip the name rather than guess.

use crate::taxonomy::base_name;

/// Uppercases and collapses every run of non-alphanumerics to a single space.
#[must_use]
pub fn normalize_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut pending_space = false;
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_space && !out.is_empty() {
                out.push(' ');
            }
            pending_space = false;
            out.push(ch.to_ascii_uppercase());
        } else {
            pending_space = true;
        }
    }
    out
}

/// Ratcliff/Obershelp similarity, `2 * matches / (len(a) + len(b))`.
///
/// Matches are counted by repeatedly taking the longest common block and
/// recursing on both sides of it. Two empty strings are identical.
#[must_use]
pub fn similarity(a: &str, b: &str) -> f64 {
    let a = a.as_bytes();
    let b = b.as_bytes();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    2.0 * matching_chars(a, b) as f64 / total as f64
}

fn matching_chars(a: &[u8], b: &[u8]) -> usize {
    let (start_a, start_b, len) = longest_common_block(a, b);
    if len == 0 {
        return 0;
    }
    len + matching_chars(&a[..start_a], &b[..start_b])
        + matching_chars(&a[start_a + len..], &b[start_b + len..])
}

/// Earliest longest common substring as (start in a, start in b, length).
fn longest_common_block(a: &[u8], b: &[u8]) -> (usize, usize, usize) {
    let mut best = (0, 0, 0);
    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];
    for i in 0..a.len() {
        for j in 0..b.len() {
            curr[j + 1] = if a[i] == b[j] { prev[j] + 1 } else { 0 };
            if curr[j + 1] > best.2 {
                best = (i + 1 - curr[j + 1], j + 1 - curr[j + 1], curr[j + 1]);
            }
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    best
}

#[derive(Debug, Clone)]
struct CatalogEntry {
    original: String,
    normalized: String,
    normalized_base: String,
}

/// API names prepared for matching.
#[derive(Debug, Clone, Default)]
pub struct NameCatalog {
    entries: Vec<CatalogEntry>,
}

impl NameCatalog {
    pub fn new<I, S>(available: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let entries = available
            .into_iter()
            .map(Into::into)
            .map(|original: String| CatalogEntry {
                normalized: normalize_name(&original),
                normalized_base: normalize_name(base_name(&original)),
                original,
            })
            .collect();
        Self { entries }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.original.as_str())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// First entry whose full or base name equals the normalized request.
    fn exact(&self, normalized: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.normalized == normalized)
            .or_else(|| self.entries.iter().find(|e| e.normalized_base == normalized))
            .map(|e| e.original.as_str())
    }
}

/// Strategy for resolving a requested name against a catalog.
pub trait NameMatcher {
    fn find<'a>(&self, requested: &str, catalog: &'a NameCatalog) -> Option<&'a str>;
}

/// Normalized exact matching only.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExactMatcher;

impl NameMatcher for ExactMatcher {
    fn find<'a>(&self, requested: &str, catalog: &'a NameCatalog) -> Option<&'a str> {
        catalog.exact(&normalize_name(requested))
    }
}

/// Exact matching first, then the most similar entry at or above `cutoff`.
///
/// Each entry is scored against both its full and its base name; the
/// better score counts. Ties keep the earlier catalog entry.
#[derive(Debug, Clone, Copy)]
pub struct FuzzyMatcher {
    pub cutoff: f64,
}

impl Default for FuzzyMatcher {
    fn default() -> Self {
        Self { cutoff: 0.75 }
    }
}

impl FuzzyMatcher {
    #[must_use]
    pub fn new(cutoff: f64) -> Self {
        Self {
            cutoff: cutoff.clamp(0.0, 1.0),
        }
    }
}

impl NameMatcher for FuzzyMatcher {
    fn find<'a>(&self, requested: &str, catalog: &'a NameCatalog) -> Option<&'a str> {
        let normalized = normalize_name(requested);
        if let Some(hit) = catalog.exact(&normalized) {
            return Some(hit);
        }

        let mut best: Option<(&CatalogEntry, f64)> = None;
        for entry in &catalog.entries {
            let score = similarity(&normalized, &entry.normalized)
                .max(similarity(&normalized, &entry.normalized_base));
            if score >= self.cutoff && best.map_or(true, |(_, s)| score > s) {
                best = Some((entry, score));
            }
        }
        best.map(|(entry, _)| entry.original.as_str())
    }
}

/// Maps every requested name to its API name, or `None` when unmatched.
///
/// Unmatched names are logged; the caller skips them.
pub fn build_market_name_map(
    requested: &[String],
    available: &NameCatalog,
    matcher: &dyn NameMatcher,
) -> Vec<(String, Option<String>)> {
    requested
        .iter()
        .map(|name| {
            let hit = matcher.find(name, available).map(str::to_string);
            if hit.is_none() {
                tracing::info!(market = %name, "No API market name matched; skipping");
            }
            (name.clone(), hit)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_collapses_punctuation() {
        assert_eq!(normalize_name("Crude Oil, Light Sweet-WTI"), "CRUDE OIL LIGHT SWEET WTI");
        assert_eq!(normalize_name("  COPPER- #1 "), "COPPER 1");
        assert_eq!(normalize_name("DJIA x $5"), "DJIA X 5");
        assert_eq!(normalize_name("---"), "");
    }

    #[test]
    fn similarity_bounds() {
        assert!((similarity("ABC", "ABC") - 1.0).abs() < 1e-12);
        assert!(similarity("ABC", "XYZ").abs() < 1e-12);
        // "ABCD" vs "BCDE": one block "BCD" of 3 chars -> 6/8
        assert!((similarity("ABCD", "BCDE") - 0.75).abs() < 1e-12);
    }

    #[test]
    fn fuzzy_matches_crude_oil_short_name() {
        let catalog = NameCatalog::new([
            "GOLD - COMMODITY EXCHANGE INC.",
            "CRUDE OIL, LIGHT SWEET - NEW YORK MERCANTILE EXCHANGE",
        ]);
        let hit = FuzzyMatcher::default().find("CRUDE OIL LIGHT SWEET WTI", &catalog);
        assert_eq!(hit, Some("CRUDE OIL, LIGHT SWEET - NEW YORK MERCANTILE EXCHANGE"));
    }

    #[test]
    fn fuzzy_rejects_names_below_floor() {
        let catalog = NameCatalog::new(["ETHEREUM - CHICAGO MERCANTILE EXCHANGE"]);
        assert_eq!(FuzzyMatcher::default().find("BITCOIN", &catalog), None);
    }

    #[test]
    fn exact_matcher_does_not_guess() {
        let catalog = NameCatalog::new(["CRUDE OIL, LIGHT SWEET - NEW YORK MERCANTILE EXCHANGE"]);
        assert_eq!(ExactMatcher.find("CRUDE OIL LIGHT SWEET WTI", &catalog), None);
        assert_eq!(
            ExactMatcher.find("crude oil, light sweet", &catalog),
            Some("CRUDE OIL, LIGHT SWEET - NEW YORK MERCANTILE EXCHANGE")
        );
    }

    #[test]
    fn name_map_keeps_request_order_and_absent_entries() {
        let catalog = NameCatalog::new(["CORN - CHICAGO BOARD OF TRADE"]);
        let requested = vec!["CORN".to_string(), "BITCOIN".to_string()];
        let map = build_market_name_map(&requested, &catalog, &FuzzyMatcher::default());
        assert_eq!(
            map,
            vec![
                ("CORN".to_string(), Some("CORN - CHICAGO BOARD OF TRADE".to_string())),
                ("BITCOIN".to_string(), None),
            ]
        );
    }
}
