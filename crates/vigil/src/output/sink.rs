//! Destinations for the failure trail.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use crate::error::{Result, VigilError};
use crate::validation::FailureRecord;

/// Receives the failure trail of a validation run for audit.
///
/// Sinks are optional: validation decisions never depend on whether a
/// sink accepted the trail.
pub trait FailureSink {
    fn write_trail(&mut self, trail: &[FailureRecord]) -> Result<()>;
}

/// Writes the trail as `index,column,reason,value` rows.
///
/// Nothing is written for an empty trail, so a stale file from an earlier
/// run is left in place rather than truncated.
#[derive(Debug, Clone)]
pub struct CsvFailureSink {
    path: PathBuf,
}

impl CsvFailureSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl FailureSink for CsvFailureSink {
    fn write_trail(&mut self, trail: &[FailureRecord]) -> Result<()> {
        if trail.is_empty() {
            return Ok(());
        }

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| VigilError::Io {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
            }
        }

        let file = File::create(&self.path).map_err(|e| VigilError::Io {
            path: self.path.clone(),
            source: e,
        })?;
        let mut writer = csv::Writer::from_writer(file);

        writer.write_record(["index", "column", "reason", "value"])?;
        for record in trail {
            writer.write_record([
                record.row_index.to_string(),
                record.column.clone(),
                record.reason.to_string(),
                record.value.to_string(),
            ])?;
        }
        writer.flush().map_err(|e| VigilError::Io {
            path: self.path.clone(),
            source: e,
        })?;

        tracing::info!(
            path = %self.path.display(),
            records = trail.len(),
            "Wrote failure trail"
        );
        Ok(())
    }
}

/// Keeps the trail in memory.
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    pub records: Vec<FailureRecord>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FailureSink for MemorySink {
    fn write_trail(&mut self, trail: &[FailureRecord]) -> Result<()> {
        self.records.extend_from_slice(trail);
        Ok(())
    }
}

/// Emits one `warn` event per failure record.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl FailureSink for TracingSink {
    fn write_trail(&mut self, trail: &[FailureRecord]) -> Result<()> {
        for record in trail {
            tracing::warn!(
                row = record.row_index,
                column = %record.column,
                reason = record.reason.as_str(),
                value = %record.value,
                "Validation failure"
            );
        }
        Ok(())
    }
}
