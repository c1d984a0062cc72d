//! Orchestration for the training and inference collaborators.
//!
//! Training: validate, split off labels, split rows, fit on the train
//! partition only, then carve a validation partition out of the processed
//! train rows. Inference: optionally validate, transform with the frozen
//! state and emit the matrix in training column order.

use serde::{Deserialize, Serialize};

use crate::artifacts::ModelArtifacts;
use crate::error::{Result, VigilError};
use crate::preprocess::{Normalizer, NormalizerConfig};
use crate::schema::ValidationConfig;
use crate::table::{FeatureTable, Value};
use crate::validation::{ValidationReport, Validator, to_number};

/// Default name of the binary label column.
pub const LABEL_COLUMN: &str = "depression_label";

/// How rows are divided into partitions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitOptions {
    pub label_column: String,
    /// Share of all rows held out as the test partition.
    pub test_fraction: f64,
    /// Share of the processed train rows held out for validation.
    pub validation_fraction: f64,
    pub seed: u64,
}

impl Default for SplitOptions {
    fn default() -> Self {
        Self {
            label_column: LABEL_COLUMN.to_string(),
            test_fraction: 0.2,
            validation_fraction: 0.2,
            seed: 42,
        }
    }
}

/// Feature rows and their labels.
#[derive(Debug, Clone, PartialEq)]
pub struct Partition {
    pub features: FeatureTable,
    pub labels: Vec<u8>,
}

impl Partition {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Row-major feature values in column order.
    pub fn matrix(&self) -> Result<Vec<Vec<f64>>> {
        let columns = self.features.columns().to_vec();
        self.features.feature_matrix(&columns)
    }

    fn subset(&self, indices: &[usize]) -> Self {
        Self {
            features: self.features.row_subset(indices),
            labels: indices.iter().map(|&i| self.labels[i]).collect(),
        }
    }
}

/// Normalized partitions plus the state inference needs.
#[derive(Debug, Clone)]
pub struct TrainingData {
    pub report: ValidationReport,
    pub train: Partition,
    pub validation: Partition,
    pub test: Partition,
    pub artifacts: ModelArtifacts,
}

/// Inference-ready rows.
#[derive(Debug, Clone)]
pub struct InferenceBatch {
    /// The transformed table, including pass-through columns.
    pub table: FeatureTable,
    /// Feature values in training column order.
    pub matrix: Vec<Vec<f64>>,
    pub threshold: f64,
}

/// Validate, split and normalize a labelled table for model training.
///
/// Refuses to proceed when validation reports any problem. Scaling
/// statistics come from the train partition only.
pub fn prepare_training(
    table: &FeatureTable,
    validation: &ValidationConfig,
    normalizer: NormalizerConfig,
    options: &SplitOptions,
) -> Result<TrainingData> {
    if table.is_empty() {
        return Err(VigilError::EmptyData("no rows to train on".to_string()));
    }

    let outcome = Validator::new(table, validation).check()?;
    let mut features = outcome.coerced;

    let label_values = features.drop_column(&options.label_column).ok_or_else(|| {
        VigilError::InvalidLabel {
            column: options.label_column.clone(),
            message: "column not found".to_string(),
        }
    })?;
    let labels = parse_labels(&options.label_column, &label_values)?;

    let all = Partition { features, labels };
    let (train_idx, test_idx) = split_indices(&all.labels, options.test_fraction, options.seed)?;
    let train_raw = all.subset(&train_idx);
    let test_raw = all.subset(&test_idx);

    let config = normalizer.without_column(&options.label_column);
    let mut normalizer = Normalizer::new(config.clone());
    let (train_processed, state) = normalizer.fit_transform(&train_raw.features)?;
    let test_processed = normalizer.transform(&test_raw.features)?;

    let feature_columns = numeric_columns(&train_processed);
    let processed = Partition {
        features: train_processed.select_columns(&feature_columns)?,
        labels: train_raw.labels,
    };
    let (inner_idx, val_idx) = split_indices(
        &processed.labels,
        options.validation_fraction,
        options.seed,
    )?;

    let data = TrainingData {
        report: outcome.report,
        train: processed.subset(&inner_idx),
        validation: processed.subset(&val_idx),
        test: Partition {
            features: test_processed.select_columns(&feature_columns)?,
            labels: test_raw.labels,
        },
        artifacts: ModelArtifacts::new(config, state, feature_columns),
    };

    tracing::info!(
        train = data.train.len(),
        validation = data.validation.len(),
        test = data.test.len(),
        features = data.artifacts.feature_columns.len(),
        "Prepared training partitions"
    );

    Ok(data)
}

/// Transform unseen rows with frozen training statistics.
///
/// A label column, if present, is dropped first. When `validation` is
/// given the rows must pass it before they are transformed.
pub fn prepare_inference(
    table: &FeatureTable,
    artifacts: &ModelArtifacts,
    validation: Option<&ValidationConfig>,
) -> Result<InferenceBatch> {
    if table.is_empty() {
        return Err(VigilError::EmptyData("no rows to score".to_string()));
    }

    let mut input = table.clone();
    input.drop_column(LABEL_COLUMN);

    if let Some(config) = validation {
        input = Validator::new(&input, config).check()?.coerced;
    }

    let transformed = artifacts.normalizer().transform(&input)?;
    let matrix = transformed.feature_matrix(&artifacts.feature_columns)?;

    tracing::debug!(rows = matrix.len(), "Prepared inference batch");

    Ok(InferenceBatch {
        table: transformed,
        matrix,
        threshold: artifacts.threshold,
    })
}

/// Columns whose every cell is numeric.
pub fn numeric_columns(table: &FeatureTable) -> Vec<String> {
    (0..table.column_count())
        .filter(|&col| table.column_values(col).all(|v| v.as_f64().is_some()))
        .map(|col| table.columns()[col].clone())
        .collect()
}

fn parse_labels(column: &str, values: &[Value]) -> Result<Vec<u8>> {
    let mut labels = Vec::with_capacity(values.len());
    for (row, value) in values.iter().enumerate() {
        let label = match to_number(value).into_value().as_f64() {
            Some(v) if v == 0.0 => 0,
            Some(v) if v == 1.0 => 1,
            _ => {
                return Err(VigilError::InvalidLabel {
                    column: column.to_string(),
                    message: format!("row {} holds '{}', expected 0 or 1", row, value),
                });
            }
        };
        labels.push(label);
    }

    if !labels.contains(&0) || !labels.contains(&1) {
        return Err(VigilError::InvalidLabel {
            column: column.to_string(),
            message: "a single class is present; both 0 and 1 are required".to_string(),
        });
    }

    Ok(labels)
}

/// Split row indices into `(kept, held_out)`, both ascending.
///
/// Stratified by label when every class has at least two rows and the
/// held-out share can hold one row per class; otherwise a plain shuffle.
pub fn split_indices(labels: &[u8], fraction: f64, seed: u64) -> Result<(Vec<usize>, Vec<usize>)> {
    let n = labels.len();
    if fraction.is_nan() || fraction <= 0.0 || fraction >= 1.0 {
        return Err(VigilError::Split(format!(
            "fraction must be in (0, 1), got {}",
            fraction
        )));
    }

    let n_held = (fraction * n as f64).ceil() as usize;
    if n_held == 0 || n_held >= n {
        return Err(VigilError::Split(format!(
            "cannot hold out {} of {} rows",
            n_held, n
        )));
    }

    let mut rng = fastrand::Rng::with_seed(seed);
    let classes: [Vec<usize>; 2] = [
        (0..n).filter(|&i| labels[i] == 0).collect(),
        (0..n).filter(|&i| labels[i] == 1).collect(),
    ];
    let present: Vec<&Vec<usize>> = classes.iter().filter(|c| !c.is_empty()).collect();
    let min_class = present.iter().map(|c| c.len()).min().unwrap_or(0);
    let stratify = min_class >= 2 && n_held >= present.len();

    let mut held = Vec::with_capacity(n_held);
    if stratify {
        let mut remaining = n_held;
        for (i, class) in present.iter().enumerate() {
            let mut members = (*class).clone();
            rng.shuffle(&mut members);

            let want = if i + 1 == present.len() {
                remaining
            } else {
                (n_held as f64 * members.len() as f64 / n as f64).round() as usize
            };
            let take = want.clamp(1, members.len() - 1);
            remaining = remaining.saturating_sub(take);
            held.extend_from_slice(&members[..take]);
        }
    } else {
        tracing::warn!(
            rows = n,
            held_out = n_held,
            min_class,
            "Falling back to a non-stratified split"
        );
        let mut all: Vec<usize> = (0..n).collect();
        rng.shuffle(&mut all);
        held.extend_from_slice(&all[..n_held]);
    }

    held.sort_unstable();
    let kept: Vec<usize> = (0..n).filter(|i| held.binary_search(i).is_err()).collect();
    Ok((kept, held))
}
