//! CLI command implementations.

pub mod fit;
pub mod schema;
pub mod transform;
pub mod validate;

use std::path::{Path, PathBuf};

use vigil::ValidationConfig;

use crate::cli::SchemaArgs;

/// Resolve `--schema` / `--config` into a validation config.
pub fn load_schema(args: &SchemaArgs) -> Result<ValidationConfig, Box<dyn std::error::Error>> {
    if let Some(path) = &args.config {
        return Ok(ValidationConfig::load(path)?);
    }
    ValidationConfig::preset(&args.schema).ok_or_else(|| {
        format!(
            "Unknown schema preset: {}. Use features_daily or weekly_sessions.",
            args.schema
        )
        .into()
    })
}

/// `<dir>/<stem>.<suffix>` next to `file`.
pub fn sibling_path(file: &Path, suffix: &str) -> PathBuf {
    let stem = file.file_stem().unwrap_or_default().to_string_lossy();
    file.with_file_name(format!("{}.{}", stem, suffix))
}
