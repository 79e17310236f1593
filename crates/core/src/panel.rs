//! The panel table shared by every pipeline stage.
//!
//! A panel is a set of rows, each belonging to one series. Identity and
//! descriptive fields are typed per row; numeric quantities live in named
//! nullable columns so that optional fields can be absent from a table and
//! stages can probe for them by name.

use crate::error::CotError;
use crate::series::SeriesKey;
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Identity and descriptive fields of one observation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowMeta {
    pub key: SeriesKey,
    pub date: NaiveDate,
    /// Exchange-qualified display name, e.g. `CORN - CHICAGO BOARD OF TRADE`.
    pub market: String,
    pub contract_name: String,
    /// Sector label, filled in by the taxonomy mapper.
    pub asset_class: Option<String>,
}

/// A named nullable numeric column.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: Vec<Option<f64>>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Panel {
    rows: Vec<RowMeta>,
    columns: Vec<Column>,
}

impl Panel {
    /// Creates a panel with the given rows and no numeric columns.
    #[must_use]
    pub fn new(rows: Vec<RowMeta>) -> Self {
        Self {
            rows,
            columns: Vec::new(),
        }
    }

    /// Creates a panel from rows and columns, checking column lengths.
    ///
    /// # Errors
    /// Returns `CotError::ColumnLength` if any column's length differs from the row count.
    pub fn from_parts(rows: Vec<RowMeta>, columns: Vec<Column>) -> Result<Self, CotError> {
        let mut panel = Self::new(rows);
        for column in columns {
            panel.insert_column(column.name, column.values)?;
        }
        Ok(panel)
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
    pub fn rows(&self) -> &[RowMeta] {
        &self.rows
    }

    pub fn rows_mut(&mut self) -> &mut [RowMeta] {
        &mut self.rows
    }

    #[must_use]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    #[must_use]
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    /// Returns a column's values, or `None` if the panel has no such column.
    #[must_use]
    pub fn values(&self, name: &str) -> Option<&[Option<f64>]> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.values.as_slice())
    }

    /// Value at `row` in column `name`; undefined if either is absent.
    #[must_use]
    pub fn value(&self, row: usize, name: &str) -> Option<f64> {
        self.values(name)?.get(row).copied().flatten()
    }

    /// Adds a column, replacing any existing column of the same name in place.
    ///
    /// # Errors
    /// Returns `CotError::ColumnLength` if `values` does not have one entry per row.
    pub fn insert_column(
        &mut self,
        name: impl Into<String>,
        values: Vec<Option<f64>>,
    ) -> Result<(), CotError> {
        let name = name.into();
        if values.len() != self.rows.len() {
            return Err(CotError::ColumnLength {
                name,
                expected: self.rows.len(),
                actual: values.len(),
            });
        }

        match self.columns.iter_mut().find(|c| c.name == name) {
            Some(existing) => existing.values = values,
            None => self.columns.push(Column { name, values }),
        }
        Ok(())
    }

    /// Builds a new panel from the rows at `indices`, in that order.
    #[must_use]
    pub fn select_rows(&self, indices: &[usize]) -> Panel {
        let rows = indices.iter().map(|&i| self.rows[i].clone()).collect();
        let columns = self
            .columns
            .iter()
            .map(|c| Column {
                name: c.name.clone(),
                values: indices.iter().map(|&i| c.values[i]).collect(),
            })
            .collect();
        Panel { rows, columns }
    }

    /// Row indices grouped by series, each group ordered by date.
    ///
    /// Rows sharing a date keep their input order. Groups are returned in
    /// series-key order.
    #[must_use]
    pub fn series_partitions(&self) -> Vec<(SeriesKey, Vec<usize>)> {
        let mut groups: BTreeMap<&SeriesKey, Vec<usize>> = BTreeMap::new();
        for (i, row) in self.rows.iter().enumerate() {
            groups.entry(&row.key).or_default().push(i);
        }

        groups
            .into_iter()
            .map(|(key, mut indices)| {
                indices.sort_by_key(|&i| self.rows[i].date);
                (key.clone(), indices)
            })
            .collect()
    }

    /// Copy of the panel sorted by (dataset, group, contract code, date).
    #[must_use]
    pub fn sorted_by_series(&self) -> Panel {
        let order: Vec<usize> = self
            .series_partitions()
            .into_iter()
            .flat_map(|(_, indices)| indices)
            .collect();
        self.select_rows(&order)
    }

    /// Stacks panels vertically.
    ///
    /// The result has the union of all columns in first-seen order; rows
    /// from a panel lacking a column get undefined values there.
    #[must_use]
    pub fn concat(panels: impl IntoIterator<Item = Panel>) -> Panel {
        let panels: Vec<Panel> = panels.into_iter().collect();

        let mut names: Vec<String> = Vec::new();
        for panel in &panels {
            for name in panel.column_names() {
                if !names.iter().any(|n| n == name) {
                    names.push(name.to_string());
                }
            }
        }

        let total: usize = panels.iter().map(Panel::len).sum();
        let mut rows = Vec::with_capacity(total);
        let mut columns: Vec<Column> = names
            .into_iter()
            .map(|name| Column {
                name,
                values: Vec::with_capacity(total),
            })
            .collect();

        for panel in panels {
            let n = panel.len();
            for column in &mut columns {
                match panel.values(&column.name) {
                    Some(values) => column.values.extend_from_slice(values),
                    None => column.values.extend(std::iter::repeat(None).take(n)),
                }
            }
            rows.extend(panel.rows);
        }

        Panel { rows, columns }
    }
}
