//! Aggregated validation report.

use serde::{Deserialize, Serialize};
use serde_json::json;

use super::issue::{Check, CheckStatus, FailureRecord, Issue, RuleOutcome, Severity};

/// Terminal verdict of a validation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    Pass,
    Fail,
}

/// Summary of one run of the rule battery.
///
/// `problems` is the sum of all problem-severity issue counts plus the
/// number of missing expected columns. Warnings never contribute to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub status: ReportStatus,
    pub checks: Vec<Check>,
    pub issues_summary: Vec<Issue>,
    pub problems: usize,
    pub warnings: usize,
    pub failed_rows_count: usize,
}

impl ValidationReport {
    /// Fold stage outcomes, in battery order, into a report and the
    /// failure trail.
    pub fn fold(outcomes: Vec<RuleOutcome>) -> (Self, Vec<FailureRecord>) {
        let mut checks = Vec::with_capacity(outcomes.len() + 1);
        let mut issues_summary = Vec::new();
        let mut failures = Vec::new();
        let mut problems = 0;
        let mut warnings = 0;

        for outcome in outcomes {
            problems += outcome.problem_count();
            warnings += outcome.warning_count();
            checks.push(outcome.check);
            issues_summary.extend(outcome.issues);
            failures.extend(outcome.failures);
        }

        let status = if problems > 0 {
            ReportStatus::Fail
        } else {
            ReportStatus::Pass
        };

        let mut summary = Check::new("summary")
            .with_detail("failed_rows_count", json!(failures.len()))
            .with_detail("issues_summary_len", json!(issues_summary.len()));
        summary.status = match status {
            ReportStatus::Fail => CheckStatus::Fail,
            ReportStatus::Pass if warnings > 0 => CheckStatus::Warn,
            ReportStatus::Pass => CheckStatus::Pass,
        };
        checks.push(summary);

        let report = Self {
            status,
            checks,
            issues_summary,
            problems,
            warnings,
            failed_rows_count: failures.len(),
        };

        (report, failures)
    }

    pub fn passed(&self) -> bool {
        self.status == ReportStatus::Pass
    }

    /// Issues of one severity, in report order.
    pub fn issues(&self, severity: Severity) -> impl Iterator<Item = &Issue> {
        self.issues_summary
            .iter()
            .filter(move |i| i.severity == severity)
    }

    /// Expected columns the table did not have.
    pub fn missing_columns(&self) -> Vec<String> {
        self.checks
            .iter()
            .filter_map(|c| c.detail.get("missing"))
            .filter_map(|v| v.as_array())
            .flatten()
            .filter_map(|v| v.as_str().map(String::from))
            .collect()
    }

    /// One line per blocking issue, for error messages.
    pub fn problem_summary(&self) -> String {
        let mut lines: Vec<String> = Vec::new();

        let missing = self.missing_columns();
        if !missing.is_empty() {
            lines.push(format!("- missing columns: {}", missing.join(", ")));
        }

        lines.extend(
            self.issues(Severity::Problem)
                .map(|i| format!("- {} on {} ({} rows)", i.rule, i.column, i.count)),
        );

        lines.join("\n")
    }
}
