//! Example: Validate and normalize a daily feature file with Vigil.
//!
//! Usage:
//!   cargo run --example validate -- <file_path>
//!
//! Example:
//!   cargo run --example validate -- data/features_daily.csv

use std::env;
use std::path::Path;

use vigil::{Normalizer, NormalizerConfig, Parser, Severity, ValidationConfig, Validator};

fn main() -> vigil::Result<()> {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: cargo run --example validate -- <file_path>");
        eprintln!("\nExample:");
        eprintln!("  cargo run --example validate -- data/features_daily.csv");
        std::process::exit(1);
    }

    let file_path = &args[1];
    let path = Path::new(file_path);

    if !path.exists() {
        eprintln!("Error: File not found: {}", file_path);
        std::process::exit(1);
    }

    let separator = "=".repeat(80);
    println!("{}", separator);
    println!("Vigil Validation: {}", file_path);
    println!("{}", separator);
    println!();

    let (table, source) = Parser::new().parse_file(path)?;

    println!("## Source Metadata");
    println!("  File: {}", source.file);
    println!("  Format: {}", source.format);
    println!("  Rows: {}", source.row_count);
    println!("  Columns: {}", source.column_count);
    println!("  SHA-256: {}", source.hash);
    println!();

    let config = ValidationConfig::features_daily();
    let outcome = Validator::new(&table, &config).validate();
    let report = &outcome.report;

    println!("## Checks");
    for check in &report.checks {
        println!("  {:28} {:?}", check.name, check.status);
    }
    println!();

    for (title, severity) in [("Problems", Severity::Problem), ("Warnings", Severity::Warning)] {
        let issues: Vec<_> = report.issues(severity).collect();
        println!("## {} ({})", title, issues.len());
        for issue in issues {
            println!("  {:38} {:40} {}", issue.rule, issue.column, issue.count);
        }
        println!();
    }

    println!("## Failure Trail (first 10 of {})", outcome.failures.len());
    for record in outcome.failures.iter().take(10) {
        println!(
            "  row {:<6} {:24} {:36} {}",
            record.row_index, record.column, record.reason, record.value
        );
    }
    println!();

    if !report.passed() {
        println!("Validation failed; skipping normalization.");
        return Ok(());
    }

    let mut normalizer = Normalizer::new(NormalizerConfig::features_daily());
    let (_, state) = normalizer.fit_transform(&outcome.coerced)?;

    println!("## Scaling Parameters");
    for (column, params) in &state.params {
        println!("  {:24} mean={:<12.4} std={:.4}", column, params.mean, params.std);
    }

    Ok(())
}
