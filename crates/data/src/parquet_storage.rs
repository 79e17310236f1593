use crate::raw::{RawRow, RawTable};
use anyhow::{Context, Result};
use arrow::array::{Array, ArrayRef, AsArray, Date32Array, Float64Array, StringArray};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Date32Type, Field, Float64Type, Schema};
use arrow::record_batch::RecordBatch;
use chrono::NaiveDate;
use cot_core::{Column, CotError, Panel, RowMeta, SeriesKey};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;
use parquet::file::properties::WriterProperties;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;

const DATASET: &str = "dataset";
const GROUP: &str = "group";
const CFTC_CODE: &str = "cftc_code";
const MARKET: &str = "market";
const CONTRACT_NAME: &str = "contract_name";
const DATE: &str = "date";
const ASSET_CLASS: &str = "asset_class";

const META_COLUMNS: [&str; 7] = [
    DATASET,
    GROUP,
    CFTC_CODE,
    MARKET,
    CONTRACT_NAME,
    DATE,
    ASSET_CLASS,
];

fn epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or_default()
}

fn to_days(date: NaiveDate) -> i32 {
    i32::try_from((date - epoch()).num_days()).unwrap_or(i32::MAX)
}

fn from_days(days: i32) -> NaiveDate {
    epoch() + chrono::Duration::days(i64::from(days))
}

pub struct ParquetStorage;

impl ParquetStorage {
    /// Writes a panel: identity columns, `date` as Date32, then one nullable
    /// Float64 column per numeric quantity.
    ///
    /// # Errors
    /// Returns an error if the file cannot be created or if writing to the Parquet file fails.
    pub fn write_panel(path: impl AsRef<Path>, panel: &Panel) -> Result<()> {
        let path = path.as_ref();
        let rows = panel.rows();

        let mut fields = vec![
            Field::new(DATASET, DataType::Utf8, false),
            Field::new(GROUP, DataType::Utf8, false),
            Field::new(CFTC_CODE, DataType::Utf8, false),
            Field::new(MARKET, DataType::Utf8, false),
            Field::new(CONTRACT_NAME, DataType::Utf8, false),
            Field::new(DATE, DataType::Date32, false),
            Field::new(ASSET_CLASS, DataType::Utf8, true),
        ];
        let text = |f: fn(&RowMeta) -> &str| -> ArrayRef {
            Arc::new(StringArray::from(rows.iter().map(f).collect::<Vec<_>>()))
        };
        let mut arrays: Vec<ArrayRef> = vec![
            text(|r| r.key.dataset.as_str()),
            text(|r| r.key.group.as_str()),
            text(|r| r.key.cftc_code.as_str()),
            text(|r| r.market.as_str()),
            text(|r| r.contract_name.as_str()),
            Arc::new(Date32Array::from(
                rows.iter().map(|r| to_days(r.date)).collect::<Vec<_>>(),
            )),
            Arc::new(StringArray::from(
                rows.iter()
                    .map(|r| r.asset_class.as_deref())
                    .collect::<Vec<_>>(),
            )),
        ];

        for column in panel.columns() {
            fields.push(Field::new(&column.name, DataType::Float64, true));
            arrays.push(Arc::new(Float64Array::from(column.values.clone())));
        }

        Self::write_batch(path, Arc::new(Schema::new(fields)), arrays)?;
        tracing::info!(path = %path.display(), rows = panel.len(), "Wrote panel");
        Ok(())
    }

    /// Reads a panel written by [`ParquetStorage::write_panel`].
    ///
    /// Numeric columns of any type castable to Float64 are loaded; other
    /// extra columns are ignored. `asset_class` is optional.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or lacks an identity column.
    pub fn read_panel(path: impl AsRef<Path>) -> Result<Panel> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("Failed to open Parquet file: {}", path.display()))?;
        let reader = ParquetRecordBatchReaderBuilder::try_new(file)?.build()?;

        let mut rows: Vec<RowMeta> = Vec::new();
        let mut columns: Vec<Column> = Vec::new();

        for batch in reader {
            let batch = batch?;
            let schema = batch.schema();

            let required = [DATASET, GROUP, CFTC_CODE, MARKET, CONTRACT_NAME, DATE];
            let missing: Vec<&str> = required
                .iter()
                .copied()
                .filter(|name| schema.index_of(name).is_err())
                .collect();
            if !missing.is_empty() {
                return Err(CotError::schema(format!("read panel {}", path.display()), missing).into());
            }

            let strings = |name: &str| -> Result<Vec<Option<String>>> {
                match batch.column_by_name(name) {
                    Some(array) => {
                        let utf8 = cast(array, &DataType::Utf8)?;
                        Ok(utf8
                            .as_string::<i32>()
                            .iter()
                            .map(|v| v.map(str::to_string))
                            .collect())
                    }
                    None => Ok(vec![None; batch.num_rows()]),
                }
            };

            let dataset = strings(DATASET)?;
            let group = strings(GROUP)?;
            let code = strings(CFTC_CODE)?;
            let market = strings(MARKET)?;
            let contract_name = strings(CONTRACT_NAME)?;
            let asset_class = strings(ASSET_CLASS)?;
            let dates_array = cast(
                batch
                    .column_by_name(DATE)
                    .context("date column vanished")?,
                &DataType::Date32,
            )?;
            let dates = dates_array.as_primitive::<Date32Type>();

            for i in 0..batch.num_rows() {
                if dates.is_null(i) {
                    tracing::warn!(row = rows.len(), "Skipping panel row without a date");
                    continue;
                }
                rows.push(RowMeta {
                    key: SeriesKey::new(
                        dataset[i].clone().unwrap_or_default(),
                        group[i].clone().unwrap_or_default(),
                        code[i].clone().unwrap_or_default(),
                    ),
                    date: from_days(dates.value(i)),
                    market: market[i].clone().unwrap_or_default(),
                    contract_name: contract_name[i].clone().unwrap_or_default(),
                    asset_class: asset_class[i].clone(),
                });
            }

            for (field, array) in schema.fields().iter().zip(batch.columns()) {
                let name = field.name();
                if META_COLUMNS.contains(&name.as_str()) {
                    continue;
                }
                if !field.data_type().is_numeric() {
                    tracing::debug!(column = %name, "Ignoring non-numeric column");
                    continue;
                }
                let floats = cast(array, &DataType::Float64)?;
                let values: Vec<Option<f64>> = floats
                    .as_primitive::<Float64Type>()
                    .iter()
                    .zip(0..)
                    .filter(|(_, i)| !dates.is_null(*i))
                    .map(|(v, _)| v.and_then(cot_core::value::finite))
                    .collect();
                match columns.iter_mut().find(|c| &c.name == name) {
                    Some(column) => column.values.extend(values),
                    None => columns.push(Column {
                        name: name.clone(),
                        values,
                    }),
                }
            }
        }

        Ok(Panel::from_parts(rows, columns)?)
    }

    /// Writes raw report rows with every column as nullable Utf8.
    ///
    /// # Errors
    /// Returns an error if the file cannot be created or if writing to the Parquet file fails.
    pub fn write_raw(path: impl AsRef<Path>, table: &RawTable) -> Result<()> {
        let path = path.as_ref();
        let fields: Vec<Field> = table
            .columns()
            .iter()
            .map(|name| Field::new(name, DataType::Utf8, true))
            .collect();
        let arrays: Vec<ArrayRef> = table
            .columns()
            .iter()
            .map(|name| {
                let values: Vec<Option<&str>> = table
                    .rows()
                    .iter()
                    .map(|row| row.get(name).map(String::as_str))
                    .collect();
                Arc::new(StringArray::from(values)) as ArrayRef
            })
            .collect();

        Self::write_batch(path, Arc::new(Schema::new(fields)), arrays)?;
        tracing::info!(path = %path.display(), rows = table.len(), "Wrote raw table");
        Ok(())
    }

    /// Reads raw report rows; non-string columns are rendered as text.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or a column cannot be cast to text.
    pub fn read_raw(path: impl AsRef<Path>) -> Result<RawTable> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("Failed to open Parquet file: {}", path.display()))?;
        let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
        let columns: Vec<String> = builder
            .schema()
            .fields()
            .iter()
            .map(|f| f.name().clone())
            .collect();

        let mut rows: Vec<RawRow> = Vec::new();
        for batch in builder.build()? {
            let batch = batch?;
            let mut batch_rows = vec![RawRow::new(); batch.num_rows()];
            for (field, array) in batch.schema().fields().iter().zip(batch.columns()) {
                let utf8 = cast(array, &DataType::Utf8)?;
                for (row, value) in batch_rows.iter_mut().zip(utf8.as_string::<i32>().iter()) {
                    if let Some(v) = value {
                        row.insert(field.name().clone(), v.to_string());
                    }
                }
            }
            rows.extend(batch_rows);
        }

        Ok(RawTable::with_columns(columns, rows))
    }

    fn write_batch(path: &Path, schema: Arc<Schema>, arrays: Vec<ArrayRef>) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
            }
        }

        let batch = if arrays.is_empty() {
            RecordBatch::new_empty(schema.clone())
        } else {
            RecordBatch::try_new(schema.clone(), arrays)?
        };

        let file = File::create(path)
            .with_context(|| format!("Failed to create Parquet file: {}", path.display()))?;
        let props = WriterProperties::builder()
            .set_compression(parquet::basic::Compression::SNAPPY)
            .build();
        let mut writer = ArrowWriter::try_new(file, schema, Some(props))?;

        writer.write(&batch)?;
        writer.close()?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_panel() -> Panel {
        let row = |code: &str, day: u32, class: Option<&str>| RowMeta {
            key: SeriesKey::new("TFF", "leveraged_funds", code),
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            market: format!("{code} - CHICAGO MERCANTILE EXCHANGE"),
            contract_name: code.to_string(),
            asset_class: class.map(str::to_string),
        };
        let mut panel = Panel::new(vec![row("EURO FX", 2, Some("FX")), row("EURO FX", 9, None)]);
        panel.insert_column("net", vec![Some(-12.5), None]).unwrap();
        panel.insert_column("net_pctile_5y", vec![None, Some(87.5)]).unwrap();
        panel
    }

    #[test]
    fn panel_survives_parquet_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("processed").join("panel.parquet");
        let panel = sample_panel();

        ParquetStorage::write_panel(&path, &panel).unwrap();
        let back = ParquetStorage::read_panel(&path).unwrap();

        assert_eq!(back, panel);
    }

    #[test]
    fn raw_table_survives_parquet_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("raw.parquet");
        let mut first = RawRow::new();
        first.insert("a".to_string(), "1".to_string());
        let mut second = RawRow::new();
        second.insert("a".to_string(), "2".to_string());
        second.insert("b".to_string(), "x".to_string());
        let table = RawTable::from_rows([first, second]);

        ParquetStorage::write_raw(&path, &table).unwrap();
        let back = ParquetStorage::read_raw(&path).unwrap();

        assert_eq!(back, table);
    }

    #[test]
    fn read_panel_reports_missing_identity_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("not_a_panel.parquet");
        let mut row = RawRow::new();
        row.insert("dataset".to_string(), "TFF".to_string());
        ParquetStorage::write_raw(&path, &RawTable::from_rows([row])).unwrap();

        let err = ParquetStorage::read_panel(&path).unwrap_err();
        let cot = err.downcast_ref::<CotError>().expect("schema error");
        assert!(matches!(cot, CotError::Schema { missing, .. } if missing.contains(&"date".to_string())));
    }
}
