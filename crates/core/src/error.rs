//! Error taxonomy shared by the pipeline stages.

use thiserror::Error;

/// Errors raised by pipeline stages.
///
/// Values that cannot be computed are never errors; they are `None`
/// in the panel. Only structural problems surface here.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CotError {
    /// A stage's input lacks required columns. No partial output is produced.
    #[error("{stage}: missing required columns {missing:?}")]
    Schema {
        stage: String,
        missing: Vec<String>,
    },

    /// The requested trader group is not reported by the source program.
    #[error("trader group '{group}' is not reported by the {program} program")]
    UnsupportedGroup { program: String, group: String },

    #[error("unknown source program '{0}' (expected one of: tff, dis)")]
    UnknownSourceProgram(String),

    #[error("unknown trader group '{0}' (expected one of: dealer, asset_mgr, lev_money, managed_money)")]
    UnknownTraderGroup(String),

    #[error("unknown statistic '{0}' (expected one of: pctile, minmax, z)")]
    UnknownStatistic(String),

    /// A column was inserted whose length does not match the panel.
    #[error("column '{name}' has {actual} values but the panel has {expected} rows")]
    ColumnLength {
        name: String,
        expected: usize,
        actual: usize,
    },
}

impl CotError {
    /// Builds a schema error for `stage` from any list of column names.
    pub fn schema<I, S>(stage: impl Into<String>, missing: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Schema {
            stage: stage.into(),
            missing: missing.into_iter().map(Into::into).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_error_names_every_missing_column() {
        let err = CotError::schema("normalize TFF/lev_money", ["open_interest_all", "lev_money_positions_long"]);
        let msg = err.to_string();
        assert!(msg.contains("open_interest_all"));
        assert!(msg.contains("lev_money_positions_long"));
        assert!(msg.starts_with("normalize TFF/lev_money"));
    }
}
