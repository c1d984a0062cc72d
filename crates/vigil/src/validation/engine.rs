//! The validator: runs the rule battery once over one table.

use crate::error::{Result, VigilError};
use crate::output::FailureSink;
use crate::schema::ValidationConfig;
use crate::table::{FeatureTable, Value};

use super::issue::{FailureRecord, RuleId, RuleOutcome};
use super::report::ValidationReport;
use super::rules::{
    Coercion, DateCoercion, IntegerIntegrity, NonNegativity, NumericCoercion, PeriodOrdering,
    RatioBounds, Rule, SchemaPresence, SessionMaxVsMean, WeeklyVsDaily, ZeroUsageRatios,
};

/// One stage of the battery.
enum Stage {
    Coerce(Box<dyn Coercion>),
    Check(Box<dyn Rule>),
}

/// The fixed battery. Coercions precede the checks that read their output.
fn battery() -> Vec<Stage> {
    vec![
        Stage::Check(Box::new(SchemaPresence)),
        Stage::Coerce(Box::new(NumericCoercion)),
        Stage::Check(Box::new(RatioBounds)),
        Stage::Check(Box::new(NonNegativity)),
        Stage::Check(Box::new(IntegerIntegrity)),
        Stage::Coerce(Box::new(DateCoercion)),
        Stage::Check(Box::new(PeriodOrdering)),
        Stage::Check(Box::new(SessionMaxVsMean)),
        Stage::Check(Box::new(ZeroUsageRatios)),
        Stage::Check(Box::new(WeeklyVsDaily)),
    ]
}

/// Everything a validation run produces.
#[derive(Debug, Clone)]
pub struct ValidationOutcome {
    pub report: ValidationReport,
    /// The input with numeric and date columns coerced. Never corrected.
    pub coerced: FeatureTable,
    /// One record per problem-severity, row-attributable violation.
    pub failures: Vec<FailureRecord>,
    int_columns: Vec<String>,
}

impl ValidationOutcome {
    pub fn passed(&self) -> bool {
        self.report.passed()
    }

    /// Copy of the coerced table with integer columns stored as `Int`.
    ///
    /// Refused while any integer-integrity problem remains, since casting
    /// would silently truncate those values.
    pub fn cast_int_columns(&self) -> Result<FeatureTable> {
        let blocked = self
            .report
            .issues_summary
            .iter()
            .any(|i| i.rule == RuleId::NonIntegerValue);
        if blocked {
            return Err(VigilError::Config(
                "Integer integrity violations exist; fix them before casting".to_string(),
            ));
        }

        let mut out = self.coerced.clone();
        for column in &self.int_columns {
            if let Some(col) = out.column_index(column) {
                out.map_column(col, |_, value| match value.as_f64() {
                    Some(v) => Value::Int(v as i64),
                    None => value.clone(),
                });
            }
        }
        Ok(out)
    }
}

/// Runs the rule battery exactly once over one table.
///
/// `validate` consumes the validator, so an instance cannot be reused for
/// a second run. The validator only inspects and reports; it never
/// corrects data.
pub struct Validator<'a> {
    table: &'a FeatureTable,
    config: &'a ValidationConfig,
    sink: Option<&'a mut dyn FailureSink>,
}

impl<'a> Validator<'a> {
    pub fn new(table: &'a FeatureTable, config: &'a ValidationConfig) -> Self {
        Self {
            table,
            config,
            sink: None,
        }
    }

    /// Send the failure trail to `sink` after the run.
    pub fn with_sink(mut self, sink: &'a mut dyn FailureSink) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Run the battery and return the report, coerced table and trail.
    ///
    /// Identical `(table, config)` pairs always produce identical output.
    pub fn validate(self) -> ValidationOutcome {
        let mut current = self.table.clone();
        let mut outcomes: Vec<RuleOutcome> = Vec::new();

        for stage in battery() {
            match stage {
                Stage::Coerce(coercion) => {
                    let (coerced, outcome) = coercion.coerce(&current, self.config);
                    current = coerced;
                    outcomes.push(outcome);
                }
                Stage::Check(rule) => outcomes.push(rule.evaluate(&current, self.config)),
            }
        }

        let (report, failures) = ValidationReport::fold(outcomes);

        tracing::info!(
            rows = current.row_count(),
            problems = report.problems,
            warnings = report.warnings,
            failed_rows = report.failed_rows_count,
            status = ?report.status,
            "Validation complete"
        );

        if let Some(sink) = self.sink {
            if let Err(e) = sink.write_trail(&failures) {
                tracing::warn!(error = %e, "Failure sink rejected the trail");
            }
        }

        ValidationOutcome {
            report,
            coerced: current,
            failures,
            int_columns: self.config.int_columns.clone(),
        }
    }

    /// Run the battery and turn any problem into an error.
    ///
    /// A run with only warnings succeeds; the warning count is in the
    /// returned report.
    pub fn check(self) -> Result<ValidationOutcome> {
        let outcome = self.validate();
        let report = &outcome.report;

        if report.problems > 0 {
            return Err(VigilError::ValidationFailed {
                problems: report.problems,
                summary: report.problem_summary(),
            });
        }

        if report.warnings > 0 {
            tracing::warn!(warnings = report.warnings, "Validation passed with warnings");
        } else {
            tracing::info!("Validation passed");
        }

        Ok(outcome)
    }
}

/// Validate `table` against `config` without a sink.
pub fn validate(table: &FeatureTable, config: &ValidationConfig) -> ValidationOutcome {
    Validator::new(table, config).validate()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::MemorySink;
    use crate::validation::ReportStatus;

    fn daily_row(values: [&str; 10]) -> Vec<Value> {
        values.iter().map(|v| Value::from_raw(v)).collect()
    }

    fn daily_table(rows: Vec<[&str; 10]>) -> FeatureTable {
        let config = ValidationConfig::features_daily();
        FeatureTable::from_rows(
            config.expected_columns.clone(),
            rows.into_iter().map(daily_row).collect(),
        )
    }

    // total_usage_daily, total_usage_weekly, late_night_ratio, sns_ent_ratio,
    // session_length_max, session_length_mean, bounce_ratio, avg_tab_cnt,
    // search_freq, repeat_site_ratio
    const CLEAN: [&str; 10] = ["120", "700", "0.2", "0.3", "40", "12", "0.1", "3", "5", "0.4"];

    #[test]
    fn test_clean_table_passes() {
        let config = ValidationConfig::features_daily();
        let table = daily_table(vec![CLEAN, CLEAN]);
        let outcome = validate(&table, &config);

        assert!(outcome.passed());
        assert_eq!(outcome.report.problems, 0);
        assert!(outcome.failures.is_empty());
        assert_eq!(
            outcome.coerced.get(0, "total_usage_daily"),
            Some(&Value::Float(120.0))
        );
    }

    #[test]
    fn test_bad_cell_is_not_double_counted() {
        let config = ValidationConfig::features_daily();
        let mut row = CLEAN;
        row[2] = "lots";
        let table = daily_table(vec![row]);
        let outcome = validate(&table, &config);

        // Coerced to null, so no later rule sees it.
        assert_eq!(outcome.report.problems, 1);
        assert_eq!(outcome.failures[0].reason, RuleId::TypeCoercionFailed);
    }

    #[test]
    fn test_missing_columns_are_not_row_attributed() {
        let config = ValidationConfig::features_daily();
        let table = FeatureTable::from_rows(
            ["total_usage_daily"],
            vec![vec![Value::from("10")]],
        );
        let outcome = validate(&table, &config);

        assert_eq!(outcome.report.problems, 9);
        assert!(outcome.failures.is_empty());
        assert_eq!(outcome.report.failed_rows_count, 0);
        assert_eq!(outcome.report.status, ReportStatus::Fail);
    }

    #[test]
    fn test_check_raises_on_problems() {
        let config = ValidationConfig::features_daily();
        let mut row = CLEAN;
        row[6] = "1.5";
        let table = daily_table(vec![row]);

        let err = Validator::new(&table, &config).check().unwrap_err();
        match err {
            VigilError::ValidationFailed { problems, summary } => {
                assert_eq!(problems, 1);
                assert!(summary.contains("ratio_out_of_bounds"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_check_passes_with_warnings() {
        let config = ValidationConfig::features_daily();
        let mut row = CLEAN;
        row[1] = "50";
        let table = daily_table(vec![row]);

        let outcome = Validator::new(&table, &config).check().unwrap();
        assert_eq!(outcome.report.warnings, 1);
        assert_eq!(outcome.report.problems, 0);
    }

    #[test]
    fn test_sink_receives_trail() {
        let config = ValidationConfig::features_daily();
        let mut row = CLEAN;
        row[8] = "-2";
        let table = daily_table(vec![CLEAN, row]);

        let mut sink = MemorySink::new();
        let outcome = Validator::new(&table, &config)
            .with_sink(&mut sink)
            .validate();

        assert_eq!(sink.records, outcome.failures);
        assert_eq!(sink.records[0].row_index, 1);
        assert_eq!(sink.records[0].reason, RuleId::NegativeValue);
    }

    #[test]
    fn test_cast_int_columns() {
        let config = ValidationConfig::features_daily();
        let table = daily_table(vec![CLEAN]);
        let cast = validate(&table, &config).cast_int_columns().unwrap();
        assert_eq!(cast.get(0, "search_freq"), Some(&Value::Int(5)));

        let mut row = CLEAN;
        row[8] = "2.5";
        let table = daily_table(vec![row]);
        assert!(validate(&table, &config).cast_int_columns().is_err());
    }

    #[test]
    fn test_validator_does_not_correct() {
        let config = ValidationConfig::features_daily();
        let mut row = CLEAN;
        row[4] = "2";
        row[5] = "5";
        let table = daily_table(vec![row]);
        let outcome = validate(&table, &config);

        assert_eq!(outcome.report.problems, 1);
        assert_eq!(
            outcome.coerced.get(0, "session_length_max"),
            Some(&Value::Float(2.0))
        );
    }
}
