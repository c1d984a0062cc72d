//! Row-major feature table.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{Result, VigilError};

use super::value::Value;

/// An ordered sequence of records sharing one column list.
///
/// Row indices are stable: no stage of the engine reorders, inserts or
/// removes rows, so an index reported by the validator addresses the same
/// record in the normalizer output.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FeatureTable {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl FeatureTable {
    /// Create an empty table with the given columns.
    pub fn new<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Self {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Create a table from rows, padding short rows with nulls and
    /// truncating long ones.
    pub fn from_rows<S: Into<String>>(
        columns: impl IntoIterator<Item = S>,
        rows: Vec<Vec<Value>>,
    ) -> Self {
        let mut table = Self::new(columns);
        for row in rows {
            table.push_row(row);
        }
        table
    }

    /// Create a table from name → value records.
    ///
    /// Columns appear in order of first appearance; a record that lacks a
    /// column gets a null cell.
    pub fn from_records(records: &[IndexMap<String, Value>]) -> Self {
        let mut columns: Vec<String> = Vec::new();
        for record in records {
            for name in record.keys() {
                if !columns.contains(name) {
                    columns.push(name.clone());
                }
            }
        }

        let rows = records
            .iter()
            .map(|record| {
                columns
                    .iter()
                    .map(|c| record.get(c).cloned().unwrap_or(Value::Null))
                    .collect()
            })
            .collect();

        Self { columns, rows }
    }

    /// Append a row, normalizing its width to the column count.
    pub fn push_row(&mut self, mut row: Vec<Value>) {
        row.resize(self.columns.len(), Value::Null);
        self.rows.push(row);
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    /// Get the number of columns.
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Get the number of rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a column by name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Get a specific cell value.
    pub fn get(&self, row: usize, column: &str) -> Option<&Value> {
        let index = self.column_index(column)?;
        self.rows.get(row).and_then(|r| r.get(index))
    }

    /// Get a cell by position.
    pub fn cell(&self, row: usize, col: usize) -> Option<&Value> {
        self.rows.get(row).and_then(|r| r.get(col))
    }

    /// Overwrite a cell by position. Out-of-range positions are ignored.
    pub fn set(&mut self, row: usize, col: usize, value: Value) {
        if let Some(cell) = self.rows.get_mut(row).and_then(|r| r.get_mut(col)) {
            *cell = value;
        }
    }

    /// Get all values for a column by index.
    pub fn column_values(&self, index: usize) -> impl Iterator<Item = &Value> {
        self.rows.iter().map(move |row| row.get(index).unwrap_or(&Value::Null))
    }

    /// Get a column by name.
    pub fn column_by_name(&self, name: &str) -> Option<Vec<&Value>> {
        let index = self.column_index(name)?;
        Some(self.column_values(index).collect())
    }

    /// A single row as a name → value record.
    pub fn record(&self, row: usize) -> Option<IndexMap<String, Value>> {
        let cells = self.rows.get(row)?;
        Some(
            self.columns
                .iter()
                .cloned()
                .zip(cells.iter().cloned())
                .collect(),
        )
    }

    /// Replace every cell of a column using `f(row_index, old_value)`.
    pub fn map_column(&mut self, col: usize, mut f: impl FnMut(usize, &Value) -> Value) {
        for (row_idx, row) in self.rows.iter_mut().enumerate() {
            if let Some(cell) = row.get_mut(col) {
                *cell = f(row_idx, cell);
            }
        }
    }

    /// Remove a column if present. Returns the removed cells.
    pub fn drop_column(&mut self, name: &str) -> Option<Vec<Value>> {
        let index = self.column_index(name)?;
        self.columns.remove(index);
        Some(self.rows.iter_mut().map(|row| row.remove(index)).collect())
    }

    /// A new table holding only the given rows, in the given order.
    pub fn row_subset(&self, indices: &[usize]) -> Self {
        Self {
            columns: self.columns.clone(),
            rows: indices
                .iter()
                .filter_map(|&i| self.rows.get(i).cloned())
                .collect(),
        }
    }

    /// A new table with only the named columns, in the requested order.
    pub fn select_columns(&self, names: &[String]) -> Result<Self> {
        let indices = self.resolve_columns(names)?;
        Ok(Self {
            columns: names.to_vec(),
            rows: self
                .rows
                .iter()
                .map(|row| indices.iter().map(|&i| row[i].clone()).collect())
                .collect(),
        })
    }

    /// Dense numeric matrix over `names`, in that column order.
    ///
    /// This is the shape handed to the external classifier, so every cell
    /// must already be numeric.
    pub fn feature_matrix(&self, names: &[String]) -> Result<Vec<Vec<f64>>> {
        let indices = self.resolve_columns(names)?;
        let mut matrix = Vec::with_capacity(self.rows.len());

        for (row_idx, row) in self.rows.iter().enumerate() {
            let mut out = Vec::with_capacity(indices.len());
            for (&col, name) in indices.iter().zip(names) {
                let value = row[col].as_f64().ok_or_else(|| VigilError::MissingFeature {
                    column: name.clone(),
                    message: format!("row {} holds a {} value", row_idx, row[col].kind()),
                })?;
                out.push(value);
            }
            matrix.push(out);
        }

        Ok(matrix)
    }

    fn resolve_columns(&self, names: &[String]) -> Result<Vec<usize>> {
        names
            .iter()
            .map(|name| {
                self.column_index(name)
                    .ok_or_else(|| VigilError::MissingFeature {
                        column: name.clone(),
                        message: "column not present in table".to_string(),
                    })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> FeatureTable {
        FeatureTable::from_rows(
            ["user_id", "a", "b"],
            vec![
                vec!["u1".into(), Value::Float(1.0), Value::Int(2)],
                vec!["u2".into(), Value::Float(3.0)],
            ],
        )
    }

    #[test]
    fn test_from_rows_pads() {
        let table = sample();
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.get(1, "b"), Some(&Value::Null));
    }

    #[test]
    fn test_from_records_preserves_first_appearance() {
        let mut r1 = IndexMap::new();
        r1.insert("x".to_string(), Value::Int(1));
        let mut r2 = IndexMap::new();
        r2.insert("y".to_string(), Value::Int(2));
        r2.insert("x".to_string(), Value::Int(3));

        let table = FeatureTable::from_records(&[r1, r2]);
        assert_eq!(table.columns(), &["x".to_string(), "y".to_string()]);
        assert_eq!(table.get(0, "y"), Some(&Value::Null));
        assert_eq!(table.get(1, "x"), Some(&Value::Int(3)));
    }

    #[test]
    fn test_drop_column() {
        let mut table = sample();
        let dropped = table.drop_column("user_id").unwrap();
        assert_eq!(dropped.len(), 2);
        assert_eq!(table.columns(), &["a".to_string(), "b".to_string()]);
        assert!(table.drop_column("missing").is_none());
    }

    #[test]
    fn test_feature_matrix_order() {
        let table = sample();
        let matrix = table
            .feature_matrix(&["b".to_string(), "a".to_string()])
            .unwrap_err();
        // Row 1 has a null in `b`.
        assert!(matches!(matrix, VigilError::MissingFeature { .. }));

        let ok = table.row_subset(&[0]).feature_matrix(&["b".to_string(), "a".to_string()]).unwrap();
        assert_eq!(ok, vec![vec![2.0, 1.0]]);
    }

    #[test]
    fn test_feature_matrix_missing_column() {
        let table = sample();
        let err = table.feature_matrix(&["zzz".to_string()]).unwrap_err();
        assert!(matches!(err, VigilError::MissingFeature { column, .. } if column == "zzz"));
    }

    #[test]
    fn test_record() {
        let table = sample();
        let record = table.record(0).unwrap();
        assert_eq!(record.get("a"), Some(&Value::Float(1.0)));
        assert!(table.record(5).is_none());
    }
}
