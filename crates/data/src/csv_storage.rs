use anyhow::{Context, Result};
use cot_core::Panel;
use csv::Writer;
use std::fs::File;
use std::path::Path;

pub struct CsvStorage;

impl CsvStorage {
    /// Writes a panel as CSV for spreadsheet consumers.
    ///
    /// Format: dataset,group,cftc_code,market,contract_name,date,asset_class,<numeric columns...>
    /// Undefined values are written as empty cells.
    ///
    /// # Errors
    /// Returns error if file cannot be created or writing fails
    pub fn write_panel(path: impl AsRef<Path>, panel: &Panel) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let file = File::create(path)
            .with_context(|| format!("Failed to create CSV file: {}", path.display()))?;
        let mut writer = Writer::from_writer(file);

        let mut header: Vec<&str> = vec![
            "dataset",
            "group",
            "cftc_code",
            "market",
            "contract_name",
            "date",
            "asset_class",
        ];
        header.extend(panel.column_names());
        writer.write_record(&header)?;

        for (i, row) in panel.rows().iter().enumerate() {
            let mut record = vec![
                row.key.dataset.clone(),
                row.key.group.clone(),
                row.key.cftc_code.clone(),
                row.market.clone(),
                row.contract_name.clone(),
                row.date.format("%Y-%m-%d").to_string(),
                row.asset_class.clone().unwrap_or_default(),
            ];
            record.extend(
                panel
                    .columns()
                    .iter()
                    .map(|c| c.values[i].map(|v| v.to_string()).unwrap_or_default()),
            );
            writer.write_record(&record)?;
        }

        writer.flush()?;
        Ok(())
    }
}
