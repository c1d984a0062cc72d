//! Delimited-text export of feature tables.

use std::fs::{self, File};
use std::path::Path;

use crate::error::{Result, VigilError};
use crate::table::FeatureTable;

/// Write a table as delimited text with a header row. Nulls are written
/// as empty cells.
pub fn write_table(table: &FeatureTable, path: impl AsRef<Path>, delimiter: u8) -> Result<()> {
    let path = path.as_ref();

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(|e| VigilError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
    }

    let file = File::create(path).map_err(|e| VigilError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(file);

    writer.write_record(table.columns())?;
    for row in table.rows() {
        writer.write_record(row.iter().map(|v| v.to_string()))?;
    }
    writer.flush().map_err(|e| VigilError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;

    Ok(())
}
