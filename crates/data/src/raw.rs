//! Raw report rows as delivered by the upstream API.
//!
//! Every cell is kept as text; typing happens in the normalizer so that a
//! malformed value degrades to undefined instead of failing the download.

use std::collections::BTreeMap;

pub type RawRow = BTreeMap<String, String>;

/// A table of raw rows with the union of their column names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTable {
    columns: Vec<String>,
    rows: Vec<RawRow>,
}

impl RawTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a table from rows; columns are listed in first-seen order.
    #[must_use]
    pub fn from_rows(rows: impl IntoIterator<Item = RawRow>) -> Self {
        let mut table = Self::new();
        for row in rows {
            table.push_row(row);
        }
        table
    }

    /// Builds a table with an explicit column list, even if no row has values.
    #[must_use]
    pub fn with_columns(columns: Vec<String>, rows: Vec<RawRow>) -> Self {
        let mut table = Self {
            columns,
            rows: Vec::with_capacity(rows.len()),
        };
        for row in rows {
            table.push_row(row);
        }
        table
    }

    pub fn push_row(&mut self, row: RawRow) {
        for name in row.keys() {
            if !self.columns.iter().any(|c| c == name) {
                self.columns.push(name.clone());
            }
        }
        self.rows.push(row);
    }

    /// Appends all rows of `other`, preserving order.
    pub fn extend(&mut self, other: RawTable) {
        for name in other.columns {
            if !self.columns.contains(&name) {
                self.columns.push(name);
            }
        }
        self.rows.extend(other.rows);
    }

    /// Sets a constant cell on every row, e.g. the requested market name.
    pub fn tag_rows(&mut self, column: &str, value: &str) {
        if !self.columns.iter().any(|c| c == column) {
            self.columns.push(column.to_string());
        }
        for row in &mut self.rows {
            row.insert(column.to_string(), value.to_string());
        }
    }

    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    #[must_use]
    pub fn rows(&self) -> &[RawRow] {
        &self.rows
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[must_use]
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    /// The subset of `required` that this table lacks, in the given order.
    #[must_use]
    pub fn missing_columns(&self, required: &[&str]) -> Vec<String> {
        required
            .iter()
            .filter(|name| !self.has_column(name))
            .map(|name| (*name).to_string())
            .collect()
    }

    /// Distinct non-empty values of a column, sorted.
    #[must_use]
    pub fn distinct(&self, column: &str) -> Vec<String> {
        let mut values: Vec<String> = self
            .rows
            .iter()
            .filter_map(|row| row.get(column))
            .filter(|v| !v.trim().is_empty())
            .cloned()
            .collect();
        values.sort();
        values.dedup();
        values
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(&str, &str)]) -> RawRow {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn columns_are_union_of_rows() {
        let table = RawTable::from_rows([row(&[("a", "1")]), row(&[("a", "2"), ("b", "x")])]);
        assert_eq!(table.columns(), &["a".to_string(), "b".to_string()]);
        assert_eq!(table.missing_columns(&["a", "c", "b", "d"]), vec!["c", "d"]);
    }

    #[test]
    fn tag_rows_and_distinct() {
        let mut table = RawTable::from_rows([
            row(&[("market", "GOLD - COMEX")]),
            row(&[("market", "CORN - CBOT")]),
            row(&[("market", "GOLD - COMEX")]),
        ]);
        table.tag_rows("__requested_market__", "GOLD");
        assert!(table.has_column("__requested_market__"));
        assert_eq!(table.distinct("market"), vec!["CORN - CBOT", "GOLD - COMEX"]);
    }
}
