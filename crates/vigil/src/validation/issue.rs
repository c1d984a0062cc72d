//! Rule identifiers, severities and per-rule outcomes.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue, json};

use crate::table::Value;

/// Severity of a rule violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Logged and counted, never blocks.
    Warning,
    /// Blocks downstream use of the table.
    Problem,
}

impl Severity {
    /// Get a human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Severity::Warning => "Warning",
            Severity::Problem => "Problem",
        }
    }
}

/// Identifier of a row-level rule.
///
/// Each rule carries a fixed severity, so a violation can never be
/// counted as both a problem and a warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleId {
    TypeCoercionFailed,
    RatioOutOfBounds,
    NegativeValue,
    NonIntegerValue,
    DatetimeParseFailed,
    EndBeforeStart,
    SpanTooLong,
    MaxLessThanMean,
    TotalUsageZeroButRatioNonzero,
    WeeklyLessThanDaily,
}

impl RuleId {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleId::TypeCoercionFailed => "type_coercion_failed",
            RuleId::RatioOutOfBounds => "ratio_out_of_bounds",
            RuleId::NegativeValue => "negative_value",
            RuleId::NonIntegerValue => "non_integer_value",
            RuleId::DatetimeParseFailed => "datetime_parse_failed",
            RuleId::EndBeforeStart => "end_before_start",
            RuleId::SpanTooLong => "span_too_long",
            RuleId::MaxLessThanMean => "max_less_than_mean",
            RuleId::TotalUsageZeroButRatioNonzero => "total_usage_zero_but_ratio_nonzero",
            RuleId::WeeklyLessThanDaily => "weekly_less_than_daily",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            RuleId::SpanTooLong | RuleId::WeeklyLessThanDaily => Severity::Warning,
            _ => Severity::Problem,
        }
    }
}

impl std::fmt::Display for RuleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

/// One aggregate entry per (column, rule) pair with at least one violation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub column: String,
    pub rule: RuleId,
    pub count: usize,
    #[serde(rename = "type")]
    pub severity: Severity,
}

/// A single problem-severity violation attributed to one row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureRecord {
    #[serde(rename = "index")]
    pub row_index: usize,
    pub column: String,
    pub reason: RuleId,
    pub value: Value,
}

/// Status of one check in the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Pass,
    Warn,
    Fail,
}

/// A named entry in the report's check list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Check {
    #[serde(rename = "check")]
    pub name: String,
    pub status: CheckStatus,
    #[serde(flatten)]
    pub detail: Map<String, JsonValue>,
}

impl Check {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: CheckStatus::Pass,
            detail: Map::new(),
        }
    }

    pub fn with_detail(mut self, key: &str, value: JsonValue) -> Self {
        self.detail.insert(key.to_string(), value);
        self
    }
}

/// Everything one stage of the battery found.
///
/// Outcomes are immutable once built; the engine folds them into the
/// final report in battery order.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleOutcome {
    pub check: Check,
    pub issues: Vec<Issue>,
    pub failures: Vec<FailureRecord>,
    /// Problems that are not attributable to a row (missing columns).
    pub schema_problems: usize,
}

impl RuleOutcome {
    pub(crate) fn new(check: impl Into<String>) -> Self {
        Self {
            check: Check::new(check),
            issues: Vec::new(),
            failures: Vec::new(),
            schema_problems: 0,
        }
    }

    /// Record the offending rows of one (column, rule) pair.
    ///
    /// Problem hits are expanded into failure records; warning hits are
    /// only counted.
    pub(crate) fn record(&mut self, column: &str, rule: RuleId, hits: Vec<(usize, Value)>) {
        if hits.is_empty() {
            return;
        }

        let severity = rule.severity();
        tracing::debug!(
            check = %self.check.name,
            column,
            rule = rule.as_str(),
            count = hits.len(),
            "Rule violations"
        );

        self.issues.push(Issue {
            column: column.to_string(),
            rule,
            count: hits.len(),
            severity,
        });

        match severity {
            Severity::Problem => {
                self.check.status = CheckStatus::Fail;
                self.failures
                    .extend(hits.into_iter().map(|(row_index, value)| FailureRecord {
                        row_index,
                        column: column.to_string(),
                        reason: rule,
                        value,
                    }));
            }
            Severity::Warning => {
                if self.check.status == CheckStatus::Pass {
                    self.check.status = CheckStatus::Warn;
                }
            }
        }
    }

    /// Seal the outcome, writing the violation total into the check detail.
    pub(crate) fn finish(mut self) -> Self {
        let violations: usize = self.issues.iter().map(|i| i.count).sum();
        self.check
            .detail
            .insert("violations".to_string(), json!(violations));
        self
    }

    pub fn problem_count(&self) -> usize {
        self.schema_problems
            + self
                .issues
                .iter()
                .filter(|i| i.severity == Severity::Problem)
                .map(|i| i.count)
                .sum::<usize>()
    }

    pub fn warning_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Warning)
            .map(|i| i.count)
            .sum()
    }
}
