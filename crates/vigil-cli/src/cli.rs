//! CLI argument definitions using clap.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Vigil: validate and normalize behavioural feature tables
#[derive(Parser)]
#[command(name = "vigil")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

/// Where the validation schema comes from.
#[derive(Args, Clone, Debug)]
pub struct SchemaArgs {
    /// Built-in schema preset (features_daily, weekly_sessions)
    #[arg(short, long, default_value = "features_daily", conflicts_with = "config")]
    pub schema: String,

    /// Path to a JSON validation config
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Validate a feature table and report problems and warnings
    Validate {
        /// Path to the data file (CSV/TSV)
        #[arg(value_name = "FILE")]
        file: PathBuf,

        #[command(flatten)]
        schema: SchemaArgs,

        /// Write the failure trail to this CSV file
        #[arg(short, long)]
        failures: Option<PathBuf>,

        /// Output the report as JSON
        #[arg(long)]
        json: bool,

        /// Exit with an error when any problem is found
        #[arg(long)]
        strict: bool,
    },

    /// Validate, split and fit the normalizer on a labelled table
    Fit {
        /// Path to the labelled data file (CSV/TSV)
        #[arg(value_name = "FILE")]
        file: PathBuf,

        #[command(flatten)]
        schema: SchemaArgs,

        /// Output path for the artifacts file (default: <file>.artifacts.json)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Name of the 0/1 label column
        #[arg(long, default_value = "depression_label")]
        label: String,

        /// Share of rows held out for testing
        #[arg(long, default_value = "0.2")]
        test_fraction: f64,

        /// Share of the train rows held out for validation
        #[arg(long, default_value = "0.2")]
        validation_fraction: f64,

        /// Seed for the deterministic split
        #[arg(long, default_value = "42")]
        seed: u64,

        /// Pin a column to a constant, excluded from scaling (COLUMN=VALUE)
        #[arg(long = "constant", value_name = "COLUMN=VALUE")]
        constants: Vec<String>,

        /// Decision threshold stored with the artifacts
        #[arg(long)]
        threshold: Option<f64>,

        /// Write the normalized train/validation/test partitions here
        #[arg(long)]
        partitions: Option<PathBuf>,
    },

    /// Normalize new rows with a saved artifacts file
    Transform {
        /// Path to the data file (CSV/TSV)
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Artifacts file produced by `vigil fit`
        #[arg(short, long)]
        artifacts: PathBuf,

        /// Validate the rows before transforming them
        #[arg(long)]
        validate: bool,

        #[command(flatten)]
        schema: SchemaArgs,

        /// Output path for the normalized table (default: <file>.normalized.csv)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print a built-in validation schema as JSON
    Schema {
        /// Preset name (features_daily, weekly_sessions)
        #[arg(value_name = "PRESET", default_value = "features_daily")]
        preset: String,
    },
}
