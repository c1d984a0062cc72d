//! Persisted preprocessing state handed from training to inference.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::{Result, VigilError};
use crate::preprocess::{FittedNormalizerState, Normalizer, NormalizerConfig};

/// Decision threshold used when none has been saved.
pub const DEFAULT_THRESHOLD: f64 = 0.5;

/// File name of the threshold document inside an artifact directory.
pub const THRESHOLD_FILE: &str = "threshold.json";

/// Everything inference needs to reproduce training-time preprocessing.
///
/// `threshold`, `model_path` and `metrics` belong to the training
/// collaborator and are stored without interpretation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifacts {
    pub normalizer: NormalizerConfig,
    pub state: FittedNormalizerState,
    /// Feature columns in the order the model was trained on.
    pub feature_columns: Vec<String>,
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    #[serde(default)]
    pub model_path: Option<PathBuf>,
    #[serde(default)]
    pub metrics: JsonValue,
}

fn default_threshold() -> f64 {
    DEFAULT_THRESHOLD
}

impl ModelArtifacts {
    pub fn new(
        normalizer: NormalizerConfig,
        state: FittedNormalizerState,
        feature_columns: Vec<String>,
    ) -> Self {
        Self {
            normalizer,
            state,
            feature_columns,
            threshold: DEFAULT_THRESHOLD,
            model_path: None,
            metrics: JsonValue::Null,
        }
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_model_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.model_path = Some(path.into());
        self
    }

    pub fn with_metrics(mut self, metrics: JsonValue) -> Self {
        self.metrics = metrics;
        self
    }

    /// A fitted normalizer carrying the frozen statistics.
    pub fn normalizer(&self) -> Normalizer {
        Normalizer::from_state(self.normalizer.clone(), self.state.clone())
    }

    /// Save as pretty-printed JSON, creating parent directories as needed.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| {
                    VigilError::Artifact(format!(
                        "Failed to create directory '{}': {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        let file = File::create(path).map_err(|e| {
            VigilError::Artifact(format!(
                "Failed to create file '{}': {}",
                path.display(),
                e
            ))
        })?;

        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self).map_err(|e| {
            VigilError::Artifact(format!("Failed to serialize artifacts: {}", e))
        })?;

        tracing::info!(path = %path.display(), "Saved model artifacts");
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let file = File::open(path).map_err(|e| {
            VigilError::Artifact(format!(
                "Failed to open file '{}': {}",
                path.display(),
                e
            ))
        })?;

        let reader = BufReader::new(file);
        let artifacts: ModelArtifacts = serde_json::from_reader(reader).map_err(|e| {
            VigilError::Artifact(format!(
                "Failed to parse artifacts '{}': {}",
                path.display(),
                e
            ))
        })?;

        Ok(artifacts)
    }
}

/// Read the decision threshold from `dir/threshold.json`.
///
/// Accepts the keys `threshold`, `best_threshold` and `thr`, then
/// `metrics.threshold`. Returns `default` when the file or every key is
/// absent. A file that exists but cannot be parsed is an error.
pub fn load_threshold(dir: impl AsRef<Path>, default: f64) -> Result<f64> {
    let path = dir.as_ref().join(THRESHOLD_FILE);
    if !path.exists() {
        return Ok(default);
    }

    let file = File::open(&path).map_err(|e| VigilError::Io {
        path: path.clone(),
        source: e,
    })?;
    let doc: JsonValue = serde_json::from_reader(BufReader::new(file))?;

    Ok(threshold_from_document(&doc).unwrap_or(default))
}

/// Write `{"threshold": t}` to `dir/threshold.json`.
pub fn save_threshold(dir: impl AsRef<Path>, threshold: f64) -> Result<()> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir).map_err(|e| VigilError::Io {
        path: dir.to_path_buf(),
        source: e,
    })?;

    let path = dir.join(THRESHOLD_FILE);
    let file = File::create(&path).map_err(|e| VigilError::Io {
        path: path.clone(),
        source: e,
    })?;
    serde_json::to_writer_pretty(BufWriter::new(file), &serde_json::json!({ "threshold": threshold }))?;
    Ok(())
}

fn threshold_from_document(doc: &JsonValue) -> Option<f64> {
    ["threshold", "best_threshold", "thr"]
        .iter()
        .find_map(|key| doc.get(key).and_then(number_like))
        .or_else(|| {
            doc.get("metrics")
                .and_then(|m| m.get("threshold"))
                .and_then(number_like)
        })
}

fn number_like(value: &JsonValue) -> Option<f64> {
    match value {
        JsonValue::Number(n) => n.as_f64(),
        JsonValue::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;
    use serde_json::json;

    fn artifacts() -> ModelArtifacts {
        let mut params = IndexMap::new();
        params.insert(
            "search_freq".to_string(),
            crate::preprocess::ScalingParams { mean: 2.0, std: 0.5 },
        );
        let state = FittedNormalizerState {
            scaled_columns: vec!["search_freq".to_string()],
            params,
        };
        ModelArtifacts::new(
            NormalizerConfig::features_daily(),
            state,
            vec!["search_freq".to_string()],
        )
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("artifacts.json");
        let saved = artifacts()
            .with_threshold(0.42)
            .with_model_path("model.bin")
            .with_metrics(json!({"f1": 0.8}));
        saved.save(&path).unwrap();

        let loaded = ModelArtifacts::load(&path).unwrap();
        assert_eq!(loaded, saved);
        assert!(loaded.normalizer().is_fitted());
    }

    #[test]
    fn test_threshold_keys() {
        assert_eq!(threshold_from_document(&json!({"threshold": 0.3})), Some(0.3));
        assert_eq!(threshold_from_document(&json!({"best_threshold": 0.4})), Some(0.4));
        assert_eq!(threshold_from_document(&json!({"thr": "0.6"})), Some(0.6));
        assert_eq!(
            threshold_from_document(&json!({"metrics": {"threshold": 0.7}})),
            Some(0.7)
        );
        assert_eq!(threshold_from_document(&json!({"auc": 0.9})), None);
    }

    #[test]
    fn test_load_threshold_defaults() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(load_threshold(dir.path(), DEFAULT_THRESHOLD).unwrap(), 0.5);

        save_threshold(dir.path(), 0.35).unwrap();
        assert_eq!(load_threshold(dir.path(), DEFAULT_THRESHOLD).unwrap(), 0.35);
    }

    #[test]
    fn test_missing_threshold_field_defaults() {
        let json = r#"{
            "normalizer": {},
            "state": {"scaled_columns": [], "params": {}},
            "feature_columns": []
        }"#;
        let loaded: ModelArtifacts = serde_json::from_str(json).unwrap();
        assert_eq!(loaded.threshold, DEFAULT_THRESHOLD);
        assert_eq!(loaded.normalizer, NormalizerConfig::features_daily());
    }
}
