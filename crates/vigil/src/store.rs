//! Daily feature rows keyed by user and date.

use chrono::NaiveDate;
use indexmap::IndexMap;

use crate::artifacts::ModelArtifacts;
use crate::error::{Result, VigilError};
use crate::schema::ValidationConfig;
use crate::table::{FeatureTable, Value};
use crate::validation::{Validator, parse_date};

/// One raw feature row.
pub type FeatureRecord = IndexMap<String, Value>;

/// Storage layer that can hand back one user's features for one day.
pub trait FeatureRowSource {
    /// `Ok(None)` when no row exists for the key.
    fn fetch_row(&self, user_id: &str, date: NaiveDate) -> Result<Option<FeatureRecord>>;
}

/// A `FeatureRowSource` backed by a map.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    rows: IndexMap<(String, NaiveDate), FeatureRecord>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the row for `(user_id, date)`.
    pub fn insert(&mut self, user_id: impl Into<String>, date: NaiveDate, record: FeatureRecord) {
        self.rows.insert((user_id.into(), date), record);
    }

    /// Build a store from a table keyed by two of its columns. The key
    /// columns are removed from the stored records.
    pub fn from_table(table: &FeatureTable, user_column: &str, date_column: &str) -> Result<Self> {
        let user_col = key_column(table, user_column)?;
        let date_col = key_column(table, date_column)?;

        let mut store = Self::new();
        for row in 0..table.row_count() {
            let user = table
                .cell(row, user_col)
                .map(|v| v.to_string())
                .filter(|s| !s.is_empty())
                .ok_or_else(|| VigilError::Store(format!("row {} has no {}", row, user_column)))?;
            let date = table
                .cell(row, date_col)
                .and_then(|v| match v {
                    Value::Date(d) => Some(*d),
                    other => parse_date(&other.to_string()),
                })
                .ok_or_else(|| {
                    VigilError::Store(format!("row {} has no valid {}", row, date_column))
                })?;

            let mut record = table.record(row).unwrap_or_default();
            record.shift_remove(user_column);
            record.shift_remove(date_column);
            store.insert(user, date, record);
        }
        Ok(store)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

fn key_column(table: &FeatureTable, name: &str) -> Result<usize> {
    table
        .column_index(name)
        .ok_or_else(|| VigilError::Store(format!("key column '{}' not found", name)))
}

impl FeatureRowSource for InMemoryStore {
    fn fetch_row(&self, user_id: &str, date: NaiveDate) -> Result<Option<FeatureRecord>> {
        Ok(self.rows.get(&(user_id.to_string(), date)).cloned())
    }
}

/// Fetch one stored row, validate it and normalize it with the frozen
/// training state. Returns a single-row table.
pub fn normalize_stored_row(
    source: &dyn FeatureRowSource,
    user_id: &str,
    date: NaiveDate,
    validation: &ValidationConfig,
    artifacts: &ModelArtifacts,
) -> Result<FeatureTable> {
    let record = source.fetch_row(user_id, date)?.ok_or_else(|| {
        VigilError::Store(format!("no feature row for user '{}' on {}", user_id, date))
    })?;

    let table = FeatureTable::from_records(&[record]);
    let outcome = Validator::new(&table, validation).check()?;
    let normalized = artifacts.normalizer().transform(&outcome.coerced)?;

    tracing::debug!(user_id, %date, "Normalized stored row");
    Ok(normalized)
}
