//! Best-effort conversion of raw cells into numbers and dates.
//!
//! Coercion never fails: a cell that cannot be converted becomes null.
//! Callers decide whether a newly introduced null is worth reporting.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::table::{FeatureTable, Value};

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%Y.%m.%d", "%Y%m%d"];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y/%m/%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Result of coercing a single cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Coerced {
    /// The cell was null before coercion.
    AlreadyNull,
    /// The cell converted cleanly.
    Converted(Value),
    /// The cell held something that could not be converted.
    Failed,
}

impl Coerced {
    /// The cell as stored in the coerced table.
    pub fn into_value(self) -> Value {
        match self {
            Coerced::Converted(v) => v,
            Coerced::AlreadyNull | Coerced::Failed => Value::Null,
        }
    }
}

/// Coerce a cell to a finite float.
///
/// NaN floats count as pre-existing nulls; infinities and unparsable text
/// are failures.
pub fn to_number(value: &Value) -> Coerced {
    match value {
        Value::Null => Coerced::AlreadyNull,
        Value::Float(f) if f.is_nan() => Coerced::AlreadyNull,
        Value::Float(f) if f.is_finite() => Coerced::Converted(Value::Float(*f)),
        Value::Int(i) => Coerced::Converted(Value::Float(*i as f64)),
        Value::Text(s) if Value::is_null_token(s) => Coerced::AlreadyNull,
        Value::Text(s) => match s.trim().parse::<f64>() {
            Ok(f) if f.is_finite() => Coerced::Converted(Value::Float(f)),
            _ => Coerced::Failed,
        },
        _ => Coerced::Failed,
    }
}

/// Coerce a cell to a calendar date.
pub fn to_date(value: &Value) -> Coerced {
    match value {
        Value::Null => Coerced::AlreadyNull,
        Value::Date(d) => Coerced::Converted(Value::Date(*d)),
        Value::Text(s) if Value::is_null_token(s) => Coerced::AlreadyNull,
        Value::Text(s) => parse_date(s)
            .map(|d| Coerced::Converted(Value::Date(d)))
            .unwrap_or(Coerced::Failed),
        Value::Int(i) => parse_date(&i.to_string())
            .map(|d| Coerced::Converted(Value::Date(d)))
            .unwrap_or(Coerced::Failed),
        Value::Float(f) if f.is_nan() => Coerced::AlreadyNull,
        Value::Float(_) => Coerced::Failed,
    }
}

/// Parse a calendar date from the accepted date and datetime layouts.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();

    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
    }

    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }

    DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive())
}

/// Coerce one column in place. Returns `(row, original value)` for every
/// cell that failed to convert. Cells that were already null are not
/// reported.
pub fn coerce_column(
    table: &mut FeatureTable,
    col: usize,
    coerce: impl Fn(&Value) -> Coerced,
) -> Vec<(usize, Value)> {
    let mut failures = Vec::new();
    table.map_column(col, |row_idx, value| match coerce(value) {
        Coerced::Failed => {
            failures.push((row_idx, value.clone()));
            Value::Null
        }
        other => other.into_value(),
    });
    failures
}
