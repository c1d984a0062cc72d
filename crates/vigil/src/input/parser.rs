//! Delimited feature-file reader.

use std::fs;
use std::path::Path;

use super::source::SourceMetadata;
use crate::error::{Result, VigilError};
use crate::table::{FeatureTable, Value};

/// Lines inspected when sniffing the delimiter.
const SNIFF_LINES: usize = 10;

/// Field separators the reader understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delimiter {
    Tab,
    Comma,
    Semicolon,
    Pipe,
}

impl Delimiter {
    /// Candidates in tie-break order.
    pub const ALL: [Delimiter; 4] = [
        Delimiter::Tab,
        Delimiter::Comma,
        Delimiter::Semicolon,
        Delimiter::Pipe,
    ];

    pub fn byte(self) -> u8 {
        match self {
            Delimiter::Tab => b'\t',
            Delimiter::Comma => b',',
            Delimiter::Semicolon => b';',
            Delimiter::Pipe => b'|',
        }
    }

    pub fn from_byte(byte: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.byte() == byte)
    }

    pub fn format_name(self) -> &'static str {
        match self {
            Delimiter::Tab => "tsv",
            Delimiter::Comma => "csv",
            Delimiter::Semicolon => "csv-semicolon",
            Delimiter::Pipe => "psv",
        }
    }
}

/// Parser configuration.
#[derive(Debug, Clone)]
pub struct ParserConfig {
    /// Field separator; sniffed from the file when `None`.
    pub delimiter: Option<u8>,
    pub has_header: bool,
    /// Stop after this many data rows.
    pub max_rows: Option<usize>,
    pub quote: u8,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            delimiter: None,
            has_header: true,
            max_rows: None,
            quote: b'"',
        }
    }
}

/// Reads delimited feature files into raw [`FeatureTable`]s.
///
/// Cells come out as [`Value::Text`], or [`Value::Null`] for null tokens
/// such as `NA` or an empty field. Typing is left to the validator.
#[derive(Debug, Clone, Default)]
pub struct Parser {
    config: ParserConfig,
}

impl Parser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ParserConfig) -> Self {
        Self { config }
    }

    /// Read a file and return the raw table with its provenance.
    pub fn parse_file(&self, path: impl AsRef<Path>) -> Result<(FeatureTable, SourceMetadata)> {
        let path = path.as_ref();
        let contents = fs::read(path).map_err(|source| VigilError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let delimiter = match self.config.delimiter {
            Some(byte) => Delimiter::from_byte(byte).unwrap_or(Delimiter::Comma),
            None => sniff_delimiter(&contents)?,
        };
        let separator = self.config.delimiter.unwrap_or(delimiter.byte());
        let table = self.parse_bytes(&contents, separator)?;

        tracing::debug!(
            path = %path.display(),
            format = delimiter.format_name(),
            rows = table.row_count(),
            columns = table.column_count(),
            "Loaded feature file"
        );

        let metadata = SourceMetadata::describe(path, &contents, delimiter, &table);
        Ok((table, metadata))
    }

    /// Parse in-memory delimited text with a known separator byte.
    pub fn parse_bytes(&self, bytes: &[u8], delimiter: u8) -> Result<FeatureTable> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .quote(self.config.quote)
            .has_headers(false)
            .flexible(true)
            .from_reader(bytes);
        let mut records = reader.records();

        let first = records
            .next()
            .transpose()?
            .ok_or_else(|| VigilError::EmptyData("No columns found".to_string()))?;

        let (columns, pending) = if self.config.has_header {
            let names: Vec<String> = first.iter().map(|name| name.trim().to_string()).collect();
            (names, None)
        } else {
            let names = (1..=first.len()).map(|i| format!("column_{}", i)).collect();
            (names, Some(first))
        };

        if columns.iter().all(|name| name.is_empty()) {
            return Err(VigilError::EmptyData("No columns found".to_string()));
        }

        let limit = self.config.max_rows.unwrap_or(usize::MAX);
        let mut table = FeatureTable::new(columns);
        for record in pending.map(Ok).into_iter().chain(records).take(limit) {
            table.push_row(record?.iter().map(Value::from_raw).collect());
        }

        if table.is_empty() {
            return Err(VigilError::EmptyData("No data rows found".to_string()));
        }
        Ok(table)
    }
}

/// Pick the separator whose field count is most stable over the first
/// non-blank lines.
///
/// A candidate that splits every sampled line into the same number of
/// fields beats one that does not; among equals the higher count wins, and
/// remaining ties fall to [`Delimiter::ALL`] order. Text with no candidate
/// at all is read as comma-separated.
fn sniff_delimiter(bytes: &[u8]) -> Result<Delimiter> {
    let text = String::from_utf8_lossy(bytes);
    let sample: Vec<&str> = text
        .lines()
        .filter(|line| !line.trim().is_empty())
        .take(SNIFF_LINES)
        .collect();

    if sample.is_empty() {
        return Err(VigilError::EmptyData("No lines to analyze".to_string()));
    }

    let mut best: Option<(Delimiter, (bool, usize))> = None;
    for delimiter in Delimiter::ALL {
        let counts: Vec<usize> = sample
            .iter()
            .map(|line| unquoted_occurrences(line, delimiter.byte()))
            .collect();
        let header = counts[0];
        if header == 0 {
            continue;
        }

        let stable = counts.iter().all(|&c| c == header);
        let score = (stable, header);
        if best.is_none_or(|(_, current)| score > current) {
            best = Some((delimiter, score));
        }
    }

    Ok(best.map_or(Delimiter::Comma, |(delimiter, _)| delimiter))
}

fn unquoted_occurrences(line: &str, delimiter: u8) -> usize {
    let mut quoted = false;
    line.bytes()
        .filter(|&b| {
            if b == b'"' {
                quoted = !quoted;
            }
            b == delimiter && !quoted
        })
        .count()
}
