//! Transform command - normalize new rows with saved artifacts.

use std::path::{Path, PathBuf};

use colored::Colorize;
use vigil::{ModelArtifacts, Parser, load_threshold, prepare_inference, write_table};

use crate::cli::SchemaArgs;

use super::{load_schema, sibling_path};

pub fn run(
    file: PathBuf,
    artifacts: PathBuf,
    validate: bool,
    schema: SchemaArgs,
    output: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let dir = artifact_dir(&artifacts);
    let loaded = ModelArtifacts::load(&artifacts)?;
    let threshold = load_threshold(&dir, loaded.threshold)?;
    let artifacts = loaded.with_threshold(threshold);
    let config = if validate {
        Some(load_schema(&schema)?)
    } else {
        None
    };

    let (table, meta) = Parser::new().parse_file(&file)?;
    let batch = prepare_inference(&table, &artifacts, config.as_ref())?;

    let output = output.unwrap_or_else(|| sibling_path(&file, "normalized.csv"));
    write_table(&batch.table, &output, b',')?;

    println!(
        "{} {} rows from {} ({} features, threshold {})",
        "Normalized".green().bold(),
        batch.matrix.len(),
        meta.file.white(),
        artifacts.feature_columns.len(),
        batch.threshold
    );
    println!("Output written to {}", output.display().to_string().cyan());

    Ok(())
}

/// Directory holding the artifacts file; a `threshold.json` there overrides
/// the threshold stored in the artifacts.
pub(crate) fn artifact_dir(artifacts: &Path) -> PathBuf {
    match artifacts.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}
