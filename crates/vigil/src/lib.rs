//! Vigil: rule-based validation and normalization for behavioural feature tables.
//!
//! Vigil checks tabular feature data against a declared schema before it
//! reaches a model, and normalizes it with statistics that are learned once
//! and then frozen.
//!
//! # Core Principles
//!
//! - **Report, don't repair**: validation inspects and counts; it never edits data
//! - **Two severities**: problems block downstream use, warnings are only counted
//! - **Frozen statistics**: scaling parameters are fitted once and reused verbatim
//!
//! # Example
//!
//! ```no_run
//! use vigil::{Parser, ValidationConfig, Validator};
//!
//! let (table, _meta) = Parser::new().parse_file("features_daily.csv").unwrap();
//! let config = ValidationConfig::features_daily();
//! let outcome = Validator::new(&table, &config).validate();
//!
//! println!("Problems: {}", outcome.report.problems);
//! println!("Warnings: {}", outcome.report.warnings);
//! ```

pub mod artifacts;
pub mod error;
pub mod input;
pub mod output;
pub mod pipeline;
pub mod preprocess;
pub mod schema;
pub mod store;
pub mod table;
pub mod validation;

pub use artifacts::{ModelArtifacts, load_threshold, save_threshold};
pub use error::{Result, VigilError};
pub use input::{Delimiter, Parser, ParserConfig, SourceMetadata};
pub use output::{CsvFailureSink, FailureSink, MemorySink, TracingSink, write_table};
pub use pipeline::{
    InferenceBatch, Partition, SplitOptions, TrainingData, prepare_inference, prepare_training,
};
pub use preprocess::{FittedNormalizerState, Normalizer, NormalizerConfig};
pub use schema::{ColumnRoles, ValidationConfig};
pub use store::{FeatureRowSource, InMemoryStore, normalize_stored_row};
pub use table::{FeatureTable, Value};
pub use validation::{
    FailureRecord, Issue, RuleId, Severity, ValidationOutcome, ValidationReport, Validator,
};
