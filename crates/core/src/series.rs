use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of one logical time series: (dataset, trader group, contract code).
///
/// The contract code is the CFTC market code, which survives contract renames.
/// Ordering is lexicographic over the three fields, which is also the order
/// the metrics panel is sorted in.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SeriesKey {
    pub dataset: String,
    pub group: String,
    pub cftc_code: String,
}

impl SeriesKey {
    pub fn new(
        dataset: impl Into<String>,
        group: impl Into<String>,
        cftc_code: impl Into<String>,
    ) -> Self {
        Self {
            dataset: dataset.into(),
            group: group.into(),
            cftc_code: cftc_code.into(),
        }
    }
}

impl fmt::Display for SeriesKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.dataset, self.group, self.cftc_code)
    }
}
