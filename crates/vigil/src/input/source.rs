//! Provenance of a loaded feature file.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::parser::Delimiter;
use crate::table::FeatureTable;

/// Where a feature table came from, recorded alongside every file parse so
/// that reports and artifacts can be traced back to their input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceMetadata {
    pub file: String,
    pub path: PathBuf,
    /// `sha256:` digest of the raw bytes.
    pub hash: String,
    pub size_bytes: u64,
    /// `csv`, `tsv`, `csv-semicolon` or `psv`.
    pub format: String,
    /// Data rows, header excluded.
    pub row_count: usize,
    pub column_count: usize,
    pub loaded_at: DateTime<Utc>,
}

impl SourceMetadata {
    /// Describe `contents`, read from `path` and parsed into `table`.
    pub fn describe(
        path: &Path,
        contents: &[u8],
        delimiter: Delimiter,
        table: &FeatureTable,
    ) -> Self {
        Self {
            file: path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default(),
            path: path.to_path_buf(),
            hash: digest(contents),
            size_bytes: contents.len() as u64,
            format: delimiter.format_name().to_string(),
            row_count: table.row_count(),
            column_count: table.column_count(),
            loaded_at: Utc::now(),
        }
    }
}

fn digest(contents: &[u8]) -> String {
    format!("sha256:{:x}", Sha256::digest(contents))
}
