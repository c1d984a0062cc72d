//! Fit command - validate, split and fit the normalizer on labelled data.

use std::path::PathBuf;

use colored::Colorize;
use vigil::{
    FeatureTable, NormalizerConfig, Parser, Partition, SplitOptions, Value, prepare_training,
    save_threshold, write_table,
};

use crate::cli::SchemaArgs;

use super::{load_schema, sibling_path};

pub struct FitArgs {
    pub file: PathBuf,
    pub schema: SchemaArgs,
    pub output: Option<PathBuf>,
    pub label: String,
    pub test_fraction: f64,
    pub validation_fraction: f64,
    pub seed: u64,
    pub constants: Vec<String>,
    pub threshold: Option<f64>,
    pub partitions: Option<PathBuf>,
}

pub fn run(args: FitArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_schema(&args.schema)?;
    let (table, meta) = Parser::new().parse_file(&args.file)?;

    let mut normalizer = if args.schema.config.is_none() && args.schema.schema == "features_daily" {
        NormalizerConfig::features_daily()
    } else {
        NormalizerConfig::from_validation(&config)
    };
    for spec in &args.constants {
        let (column, value) = parse_constant(spec)?;
        normalizer = normalizer.with_constant(column, value);
    }

    let options = SplitOptions {
        label_column: args.label,
        test_fraction: args.test_fraction,
        validation_fraction: args.validation_fraction,
        seed: args.seed,
    };

    println!(
        "{} {} ({} rows)",
        "Fitting on".cyan().bold(),
        meta.file.white(),
        meta.row_count
    );

    let data = prepare_training(&table, &config, normalizer, &options)?;

    let mut artifacts = data.artifacts.clone();
    if let Some(threshold) = args.threshold {
        artifacts = artifacts.with_threshold(threshold);
    }
    let output = args
        .output
        .unwrap_or_else(|| sibling_path(&args.file, "artifacts.json"));
    artifacts.save(&output)?;
    if let Some(threshold) = args.threshold {
        save_threshold(super::transform::artifact_dir(&output), threshold)?;
    }

    println!();
    println!("{}", "Partitions:".yellow().bold());
    println!("  Train:      {}", data.train.len().to_string().white());
    println!("  Validation: {}", data.validation.len().to_string().white());
    println!("  Test:       {}", data.test.len().to_string().white());
    println!();
    println!("{}", "Scaled columns:".yellow().bold());
    for (column, params) in &artifacts.state.params {
        println!("  {:<24} mean={:.4} std={:.4}", column, params.mean, params.std);
    }
    if data.report.warnings > 0 {
        println!();
        println!(
            "{} {} warnings during validation",
            "Note:".yellow(),
            data.report.warnings
        );
    }

    if let Some(dir) = &args.partitions {
        for (name, partition) in [
            ("train", &data.train),
            ("validation", &data.validation),
            ("test", &data.test),
        ] {
            let path = dir.join(format!("{}.csv", name));
            write_table(&with_labels(partition, &options.label_column), &path, b',')?;
        }
        println!();
        println!("Partitions written to {}", dir.display().to_string().cyan());
    }

    println!();
    println!(
        "{} {}",
        "Artifacts saved to".green().bold(),
        output.display().to_string().white()
    );

    Ok(())
}

fn parse_constant(spec: &str) -> Result<(String, f64), Box<dyn std::error::Error>> {
    let (column, value) = spec
        .split_once('=')
        .ok_or_else(|| format!("Invalid constant '{}': expected COLUMN=VALUE", spec))?;
    let value: f64 = value
        .trim()
        .parse()
        .map_err(|_| format!("Invalid constant value in '{}'", spec))?;
    Ok((column.trim().to_string(), value))
}

fn with_labels(partition: &Partition, label_column: &str) -> FeatureTable {
    let mut columns = partition.features.columns().to_vec();
    columns.push(label_column.to_string());

    let rows = partition
        .features
        .rows()
        .iter()
        .zip(&partition.labels)
        .map(|(row, label)| {
            let mut row = row.clone();
            row.push(Value::Int(i64::from(*label)));
            row
        })
        .collect();

    FeatureTable::from_rows(columns, rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_constant() {
        assert_eq!(
            parse_constant("avg_tab_cnt=0").unwrap(),
            ("avg_tab_cnt".to_string(), 0.0)
        );
        assert!(parse_constant("avg_tab_cnt").is_err());
        assert!(parse_constant("avg_tab_cnt=lots").is_err());
    }

    #[test]
    fn test_with_labels() {
        let partition = Partition {
            features: FeatureTable::from_rows(["a"], vec![vec![Value::Float(0.5)]]),
            labels: vec![1],
        };
        let table = with_labels(&partition, "y");
        assert_eq!(table.columns(), ["a", "y"]);
        assert_eq!(table.get(0, "y"), Some(&Value::Int(1)));
    }
}
