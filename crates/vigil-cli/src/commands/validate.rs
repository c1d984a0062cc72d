//! Validate command - run the rule battery over a feature table.

use std::io::{self, Write};
use std::path::PathBuf;

use colored::Colorize;
use vigil::validation::CheckStatus;
use vigil::{
    CsvFailureSink, FailureSink, Parser, Severity, TracingSink, ValidationReport, Validator,
};

use crate::cli::SchemaArgs;

use super::load_schema;

pub fn run(
    file: PathBuf,
    schema: SchemaArgs,
    failures: Option<PathBuf>,
    json_output: bool,
    strict: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_schema(&schema)?;
    let (table, meta) = Parser::new().parse_file(&file)?;

    // Without a trail file the records go to the log instead.
    let mut sink: Box<dyn FailureSink> = match &failures {
        Some(path) => Box::new(CsvFailureSink::new(path)),
        None => Box::new(TracingSink),
    };
    let outcome = Validator::new(&table, &config)
        .with_sink(sink.as_mut())
        .validate();
    let report = &outcome.report;

    if json_output {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        println!(
            "{} {} ({} rows, {} columns)",
            "Validating".cyan().bold(),
            meta.file.white(),
            meta.row_count,
            meta.column_count
        );
        println!();

        println!("{}", "Checks:".yellow().bold());
        for check in &report.checks {
            let status = match check.status {
                CheckStatus::Pass => "pass".green(),
                CheckStatus::Warn => "warn".yellow(),
                CheckStatus::Fail => "fail".red(),
            };
            println!("  [{}] {}", status, check.name);
        }
        println!();

        write_summary(report, &mut io::stdout().lock())?;

        if let (Some(path), false) = (&failures, outcome.failures.is_empty()) {
            println!("Failure trail written to {}", path.display().to_string().cyan());
        }

        if report.passed() {
            println!("{}", "Validation passed.".green().bold());
        } else {
            println!("{}", "Validation failed.".red().bold());
        }
    }

    if strict && !report.passed() {
        return Err(format!(
            "Validation failed: {} problems detected\n\nProblem Summary:\n{}",
            report.problems,
            report.problem_summary()
        )
        .into());
    }

    Ok(())
}

/// Issues, missing columns and totals. Missing columns are listed even when
/// they are the only defect, since they carry no issue entry.
fn write_summary(report: &ValidationReport, out: &mut impl Write) -> io::Result<()> {
    if !report.issues_summary.is_empty() {
        writeln!(out, "{}", "Issues:".yellow().bold())?;
        for issue in &report.issues_summary {
            let label = match issue.severity {
                Severity::Problem => issue.severity.label().red(),
                Severity::Warning => issue.severity.label().yellow(),
            };
            writeln!(
                out,
                "  {:<8} {} on {} ({} rows)",
                label, issue.rule, issue.column, issue.count
            )?;
        }
        writeln!(out)?;
    }

    let missing = report.missing_columns();
    if !missing.is_empty() {
        writeln!(out, "{} {}", "Missing columns:".red().bold(), missing.join(", "))?;
        writeln!(out)?;
    }

    writeln!(
        out,
        "Problems: {}  Warnings: {}  Failed rows: {}",
        report.problems.to_string().red().bold(),
        report.warnings.to_string().yellow(),
        report.failed_rows_count
    )
}
