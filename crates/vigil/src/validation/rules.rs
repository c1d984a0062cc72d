//! The rule battery.
//!
//! Every stage is a pure function of the current table and the config.
//! Coercion stages additionally hand back the coerced table that later
//! stages inspect.

use serde_json::json;

use crate::schema::ValidationConfig;
use crate::table::{FeatureTable, Value};

use super::coerce::{coerce_column, to_date, to_number};
use super::issue::{CheckStatus, RuleId, RuleOutcome};

/// Absolute slack used by the cross-column comparisons.
pub const TOLERANCE: f64 = 1e-9;

/// Longest reporting period, in days, before a span warning is raised.
pub const MAX_SPAN_DAYS: i64 = 60;

/// A check that inspects a table without changing it.
pub trait Rule {
    /// Name of the check as it appears in the report.
    fn name(&self) -> &'static str;

    /// Run the check and return its outcome.
    fn evaluate(&self, table: &FeatureTable, config: &ValidationConfig) -> RuleOutcome;
}

/// A stage that converts declared columns and reports cells it had to null.
pub trait Coercion {
    fn name(&self) -> &'static str;

    fn coerce(&self, table: &FeatureTable, config: &ValidationConfig)
    -> (FeatureTable, RuleOutcome);
}

/// Numeric view of a cell; anything non-numeric reads as null.
fn number(table: &FeatureTable, row: usize, col: usize) -> Option<f64> {
    table.cell(row, col).and_then(Value::as_f64)
}

/// Collect `(row, value)` for every non-null cell of `col` matching `pred`.
fn scan_column(
    table: &FeatureTable,
    col: usize,
    pred: impl Fn(f64) -> bool,
) -> Vec<(usize, Value)> {
    table
        .column_values(col)
        .enumerate()
        .filter_map(|(row, value)| {
            value
                .as_f64()
                .filter(|v| pred(*v))
                .map(|v| (row, Value::Float(v)))
        })
        .collect()
}

/// Every expected column must exist.
pub struct SchemaPresence;

impl Rule for SchemaPresence {
    fn name(&self) -> &'static str {
        "required_columns_present"
    }

    fn evaluate(&self, table: &FeatureTable, config: &ValidationConfig) -> RuleOutcome {
        let missing: Vec<&str> = config
            .expected_columns
            .iter()
            .filter(|c| !table.has_column(c))
            .map(String::as_str)
            .collect();

        let mut outcome = RuleOutcome::new(self.name());
        outcome.check = outcome.check.with_detail("missing", json!(missing));
        if !missing.is_empty() {
            tracing::debug!(missing = ?missing, "Expected columns absent");
            outcome.check.status = CheckStatus::Fail;
            outcome.schema_problems = missing.len();
        }
        outcome
    }
}

/// Parse float, ratio and integer columns as numbers.
pub struct NumericCoercion;

impl Coercion for NumericCoercion {
    fn name(&self) -> &'static str {
        "numeric_coercion"
    }

    fn coerce(
        &self,
        table: &FeatureTable,
        config: &ValidationConfig,
    ) -> (FeatureTable, RuleOutcome) {
        let mut coerced = table.clone();
        let mut outcome = RuleOutcome::new(self.name());

        for column in config.numeric_columns() {
            if let Some(col) = coerced.column_index(column) {
                let failures = coerce_column(&mut coerced, col, to_number);
                outcome.record(column, RuleId::TypeCoercionFailed, failures);
            }
        }

        (coerced, outcome.finish())
    }
}

/// Ratio columns must lie in [0, 1].
pub struct RatioBounds;

impl Rule for RatioBounds {
    fn name(&self) -> &'static str {
        "ratio_bounds"
    }

    fn evaluate(&self, table: &FeatureTable, config: &ValidationConfig) -> RuleOutcome {
        let mut outcome = RuleOutcome::new(self.name());
        for column in &config.ratio_columns {
            if let Some(col) = table.column_index(column) {
                let hits = scan_column(table, col, |v| !(0.0..=1.0).contains(&v));
                outcome.record(column, RuleId::RatioOutOfBounds, hits);
            }
        }
        outcome.finish()
    }
}

/// Float and integer columns must not be negative.
pub struct NonNegativity;

impl Rule for NonNegativity {
    fn name(&self) -> &'static str {
        "non_negative"
    }

    fn evaluate(&self, table: &FeatureTable, config: &ValidationConfig) -> RuleOutcome {
        let mut outcome = RuleOutcome::new(self.name());
        for column in config.signed_columns() {
            if let Some(col) = table.column_index(column) {
                let hits = scan_column(table, col, |v| v < 0.0);
                outcome.record(column, RuleId::NegativeValue, hits);
            }
        }
        outcome.finish()
    }
}

/// Integer columns must not carry a fractional part.
pub struct IntegerIntegrity;

impl Rule for IntegerIntegrity {
    fn name(&self) -> &'static str {
        "integer_integrity"
    }

    fn evaluate(&self, table: &FeatureTable, config: &ValidationConfig) -> RuleOutcome {
        let mut outcome = RuleOutcome::new(self.name());
        for column in &config.int_columns {
            if let Some(col) = table.column_index(column) {
                let hits = scan_column(table, col, |v| v.fract() != 0.0);
                outcome.record(column, RuleId::NonIntegerValue, hits);
            }
        }
        outcome.finish()
    }
}

/// Parse date columns as calendar dates.
pub struct DateCoercion;

impl Coercion for DateCoercion {
    fn name(&self) -> &'static str {
        "date_coercion"
    }

    fn coerce(
        &self,
        table: &FeatureTable,
        config: &ValidationConfig,
    ) -> (FeatureTable, RuleOutcome) {
        let mut coerced = table.clone();
        let mut outcome = RuleOutcome::new(self.name());

        for column in &config.date_columns {
            if let Some(col) = coerced.column_index(column) {
                let failures = coerce_column(&mut coerced, col, to_date);
                outcome.record(column, RuleId::DatetimeParseFailed, failures);
            }
        }

        (coerced, outcome.finish())
    }
}

/// Period end must not precede period start; long periods are suspicious.
pub struct PeriodOrdering;

impl Rule for PeriodOrdering {
    fn name(&self) -> &'static str {
        "period_ordering"
    }

    fn evaluate(&self, table: &FeatureTable, config: &ValidationConfig) -> RuleOutcome {
        let mut outcome = RuleOutcome::new(self.name());
        let roles = &config.roles;

        if !config.is_date_column(&roles.period_start) || !config.is_date_column(&roles.period_end)
        {
            return outcome.finish();
        }
        let (Some(start_col), Some(end_col)) = (
            table.column_index(&roles.period_start),
            table.column_index(&roles.period_end),
        ) else {
            return outcome.finish();
        };

        let mut reversed = Vec::new();
        let mut too_long = Vec::new();
        for row in 0..table.row_count() {
            let start = table.cell(row, start_col).and_then(Value::as_date);
            let end = table.cell(row, end_col).and_then(Value::as_date);
            let (Some(start), Some(end)) = (start, end) else {
                continue;
            };

            if end < start {
                reversed.push((row, Value::Null));
            }
            let span = (end - start).num_days();
            if span > MAX_SPAN_DAYS {
                too_long.push((row, Value::Int(span)));
            }
        }

        let column = format!("{}/{}", roles.period_start, roles.period_end);
        outcome.record(&column, RuleId::EndBeforeStart, reversed);
        outcome.record(&column, RuleId::SpanTooLong, too_long);
        outcome.finish()
    }
}

/// Longest session must not be shorter than the mean session.
pub struct SessionMaxVsMean;

impl Rule for SessionMaxVsMean {
    fn name(&self) -> &'static str {
        "session_max_vs_mean"
    }

    fn evaluate(&self, table: &FeatureTable, config: &ValidationConfig) -> RuleOutcome {
        let mut outcome = RuleOutcome::new(self.name());
        let roles = &config.roles;
        if !config.is_numeric_column(&roles.session_length_max)
            || !config.is_numeric_column(&roles.session_length_mean)
        {
            return outcome.finish();
        }

        let (Some(max_col), Some(mean_col)) = (
            table.column_index(&roles.session_length_max),
            table.column_index(&roles.session_length_mean),
        ) else {
            return outcome.finish();
        };

        let hits: Vec<(usize, Value)> = (0..table.row_count())
            .filter_map(|row| {
                let max = number(table, row, max_col)?;
                let mean = number(table, row, mean_col)?;
                (max < mean - TOLERANCE).then(|| (row, Value::Float(max - mean)))
            })
            .collect();

        let column = format!("{}/{}", roles.session_length_max, roles.session_length_mean);
        outcome.record(&column, RuleId::MaxLessThanMean, hits);
        outcome.finish()
    }
}

/// A day without usage cannot have non-zero usage ratios.
///
/// Null usage counts as zero and a null ratio counts as zero. An opaque
/// usage column (in no numeric group) never triggers the rule.
pub struct ZeroUsageRatios;

impl Rule for ZeroUsageRatios {
    fn name(&self) -> &'static str {
        "zero_usage_ratios"
    }

    fn evaluate(&self, table: &FeatureTable, config: &ValidationConfig) -> RuleOutcome {
        let mut outcome = RuleOutcome::new(self.name());
        if !config.is_numeric_column(&config.roles.total_usage_daily) {
            return outcome.finish();
        }

        let Some(usage_col) = table.column_index(&config.roles.total_usage_daily) else {
            return outcome.finish();
        };

        let zero_rows: Vec<usize> = (0..table.row_count())
            .filter(|&row| number(table, row, usage_col).unwrap_or(0.0) == 0.0)
            .collect();

        for column in &config.ratio_columns {
            let Some(col) = table.column_index(column) else {
                continue;
            };
            let hits: Vec<(usize, Value)> = zero_rows
                .iter()
                .filter_map(|&row| {
                    let ratio = number(table, row, col).unwrap_or(0.0);
                    (ratio != 0.0).then(|| (row, Value::Float(ratio)))
                })
                .collect();
            outcome.record(column, RuleId::TotalUsageZeroButRatioNonzero, hits);
        }

        outcome.finish()
    }
}

/// Weekly usage should cover daily usage. Warning only.
pub struct WeeklyVsDaily;

impl Rule for WeeklyVsDaily {
    fn name(&self) -> &'static str {
        "weekly_vs_daily"
    }

    fn evaluate(&self, table: &FeatureTable, config: &ValidationConfig) -> RuleOutcome {
        let mut outcome = RuleOutcome::new(self.name());
        let roles = &config.roles;
        if !config.is_numeric_column(&roles.total_usage_daily)
            || !config.is_numeric_column(&roles.total_usage_weekly)
        {
            return outcome.finish();
        }

        let (Some(daily_col), Some(weekly_col)) = (
            table.column_index(&roles.total_usage_daily),
            table.column_index(&roles.total_usage_weekly),
        ) else {
            return outcome.finish();
        };

        let hits: Vec<(usize, Value)> = (0..table.row_count())
            .filter_map(|row| {
                let daily = number(table, row, daily_col)?;
                let weekly = number(table, row, weekly_col)?;
                (weekly + TOLERANCE < daily).then(|| (row, Value::Float(weekly)))
            })
            .collect();

        let column = format!("{}/{}", roles.total_usage_weekly, roles.total_usage_daily);
        outcome.record(&column, RuleId::WeeklyLessThanDaily, hits);
        outcome.finish()
    }
}
