//! Property-based tests for the validator and normalizer.
//!
//! These tests use proptest to generate random feature tables and verify
//! that the rule battery and the normalizer keep their invariants.
//!
//! # Running Property Tests
//!
//! ```bash
//! cargo test -p vigil --test property_tests
//!
//! # More cases (slower but more thorough)
//! PROPTEST_CASES=10000 cargo test -p vigil --test property_tests
//! ```

use proptest::prelude::*;

use vigil::{
    FeatureTable, Normalizer, NormalizerConfig, RuleId, ValidationConfig, Validator, Value,
};

// =============================================================================
// Test Strategies
// =============================================================================

/// A raw cell as it might arrive from a file.
fn raw_cell() -> impl Strategy<Value = Value> {
    prop_oneof![
        4 => (-2.0f64..200.0).prop_map(Value::Float),
        2 => (-5i64..50).prop_map(Value::Int),
        1 => Just(Value::Null),
        1 => "[a-z]{1,5}".prop_map(Value::Text),
        1 => (-2.0f64..3.0).prop_map(|f| Value::Text(format!("{:.3}", f))),
    ]
}

/// A ratio-ish cell, mostly in range.
fn ratio_cell() -> impl Strategy<Value = Value> {
    prop_oneof![
        6 => (0.0f64..=1.0).prop_map(Value::Float),
        2 => (-1.0f64..2.5).prop_map(Value::Float),
        1 => Just(Value::Null),
    ]
}

fn daily_row() -> impl Strategy<Value = Vec<Value>> {
    (
        raw_cell(),
        raw_cell(),
        ratio_cell(),
        ratio_cell(),
        raw_cell(),
        raw_cell(),
        ratio_cell(),
        raw_cell(),
        raw_cell(),
        ratio_cell(),
    )
        .prop_map(|(a, b, c, d, e, f, g, h, i, j)| vec![a, b, c, d, e, f, g, h, i, j])
}

fn daily_table(max_rows: usize) -> impl Strategy<Value = FeatureTable> {
    prop::collection::vec(daily_row(), 1..max_rows).prop_map(|rows| {
        FeatureTable::from_rows(ValidationConfig::features_daily().expected_columns, rows)
    })
}

/// Count ratio cells that coerce to a finite number outside [0, 1].
fn out_of_bounds_cells(table: &FeatureTable, config: &ValidationConfig) -> usize {
    config
        .ratio_columns
        .iter()
        .filter_map(|c| table.column_by_name(c))
        .flatten()
        .filter_map(|v| match v {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        })
        .filter(|f| f.is_finite() && !(0.0..=1.0).contains(f))
        .count()
}

// =============================================================================
// Validator Properties
// =============================================================================

mod validator {
    use super::*;

    proptest! {
        /// Validation never panics on arbitrary cells.
        #[test]
        fn never_panics(table in daily_table(30)) {
            let config = ValidationConfig::features_daily();
            let _ = Validator::new(&table, &config).validate();
        }

        /// Same table and config always give the same report and trail.
        #[test]
        fn validation_is_deterministic(table in daily_table(30)) {
            let config = ValidationConfig::features_daily();
            let a = Validator::new(&table, &config).validate();
            let b = Validator::new(&table, &config).validate();

            prop_assert_eq!(a.report, b.report);
            prop_assert_eq!(a.failures, b.failures);
        }

        /// Each out-of-range ratio cell is counted exactly once.
        #[test]
        fn ratio_bound_count_is_exact(table in daily_table(30)) {
            let config = ValidationConfig::features_daily();
            let outcome = Validator::new(&table, &config).validate();

            let counted: usize = outcome
                .report
                .issues_summary
                .iter()
                .filter(|i| i.rule == RuleId::RatioOutOfBounds)
                .map(|i| i.count)
                .sum();
            prop_assert_eq!(counted, out_of_bounds_cells(&table, &config));
        }

        /// Problems equal the trail length when no column is missing, and
        /// warnings never leave a record.
        #[test]
        fn problems_match_trail(table in daily_table(30)) {
            let config = ValidationConfig::features_daily();
            let outcome = Validator::new(&table, &config).validate();

            prop_assert_eq!(outcome.report.problems, outcome.failures.len());
            prop_assert_eq!(outcome.report.failed_rows_count, outcome.failures.len());
            prop_assert!(outcome
                .failures
                .iter()
                .all(|f| f.reason != RuleId::WeeklyLessThanDaily));
            prop_assert_eq!(outcome.passed(), outcome.report.problems == 0);
        }

        /// Every zero-usage row with a non-zero ratio is flagged.
        #[test]
        fn zero_usage_rows_are_flagged(table in daily_table(20)) {
            let config = ValidationConfig::features_daily();
            let outcome = Validator::new(&table, &config).validate();
            let coerced = &outcome.coerced;

            for row in 0..coerced.row_count() {
                let usage = coerced
                    .get(row, "total_usage_daily")
                    .and_then(Value::as_f64)
                    .unwrap_or(0.0);
                if usage != 0.0 {
                    continue;
                }
                for column in &config.ratio_columns {
                    let ratio = coerced.get(row, column).and_then(Value::as_f64).unwrap_or(0.0);
                    if ratio != 0.0 {
                        let flagged = outcome.failures.iter().any(|f| {
                            f.row_index == row
                                && &f.column == column
                                && f.reason == RuleId::TotalUsageZeroButRatioNonzero
                        });
                        prop_assert!(flagged);
                    }
                }
            }
        }
    }
}

// =============================================================================
// Normalizer Properties
// =============================================================================

mod normalizer {
    use super::*;

    proptest! {
        /// After preprocessing, session max is never below session mean.
        #[test]
        fn max_not_below_mean(
            pairs in prop::collection::vec((0.0f64..500.0, 0.0f64..500.0), 2..40)
        ) {
            let config = ValidationConfig::features_daily();
            let rows: Vec<Vec<Value>> = pairs
                .iter()
                .map(|&(max, mean)| {
                    let mut row = vec![Value::Float(1.0); 10];
                    row[4] = Value::Float(max);
                    row[5] = Value::Float(mean);
                    row
                })
                .collect();
            let table = FeatureTable::from_rows(config.expected_columns, rows);

            let mut normalizer = Normalizer::new(NormalizerConfig::features_daily());
            let (out, state) = normalizer.fit_transform(&table).unwrap();
            let max_params = state.params["session_length_max"];
            let mean_params = state.params["session_length_mean"];

            for row in 0..out.row_count() {
                let scaled_max = out.get(row, "session_length_max").and_then(Value::as_f64).unwrap();
                let scaled_mean = out.get(row, "session_length_mean").and_then(Value::as_f64).unwrap();
                let max = scaled_max * max_params.std + max_params.mean;
                let mean = scaled_mean * mean_params.std + mean_params.mean;
                prop_assert!(max + 1e-6 >= mean);
            }
        }

        /// Output is fully numeric for every declared column.
        #[test]
        fn output_is_numeric(table in daily_table(30)) {
            let mut normalizer = Normalizer::new(NormalizerConfig::features_daily());
            let (out, _) = normalizer.fit_transform(&table).unwrap();

            for column in out.columns() {
                let values = out.column_by_name(column).unwrap();
                prop_assert!(values.iter().all(|v| v.as_f64().is_some_and(f64::is_finite)));
            }
        }

        /// Transform reuses fitted statistics: fitting on a table and then
        /// transforming the same table gives identical output.
        #[test]
        fn transform_matches_fit(table in daily_table(30)) {
            let mut normalizer = Normalizer::new(NormalizerConfig::features_daily());
            let (fitted, _) = normalizer.fit_transform(&table).unwrap();
            let transformed = normalizer.transform(&table).unwrap();
            prop_assert_eq!(fitted, transformed);
        }
    }
}
