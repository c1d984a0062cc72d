use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::schema::ValidationConfig;

/// Column groups the normalizer treats differently.
///
/// Columns not named in any group pass through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizerConfig {
    /// Columns that must exist before anything else runs.
    pub required_columns: Vec<String>,
    /// Continuous columns, imputed with the batch median.
    pub float_columns: Vec<String>,
    /// Proportions, imputed with 0.0 and clipped to [0, 1].
    pub ratio_columns: Vec<String>,
    /// Counts, imputed with the rounded batch median and rounded.
    pub integer_columns: Vec<String>,
    /// Columns forced to a constant and left out of scaling.
    pub constant_columns: IndexMap<String, f64>,
    pub session_max: String,
    pub session_mean: String,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self::features_daily()
    }
}

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

impl NormalizerConfig {
    /// Normalizer for the `features_daily` table. `avg_tab_cnt` is kept
    /// in the output shape but pinned to zero.
    pub fn features_daily() -> Self {
        let mut constant_columns = IndexMap::new();
        constant_columns.insert("avg_tab_cnt".to_string(), 0.0);

        Self {
            required_columns: ValidationConfig::features_daily().expected_columns,
            float_columns: names(&[
                "total_usage_daily",
                "total_usage_weekly",
                "session_length_max",
                "session_length_mean",
            ]),
            ratio_columns: names(&[
                "late_night_ratio",
                "sns_ent_ratio",
                "bounce_ratio",
                "repeat_site_ratio",
            ]),
            integer_columns: names(&["search_freq"]),
            constant_columns,
            session_max: "session_length_max".to_string(),
            session_mean: "session_length_mean".to_string(),
        }
    }

    /// Derive a normalizer from a validation schema. Date columns are
    /// required by validation only and are not normalized.
    pub fn from_validation(config: &ValidationConfig) -> Self {
        Self {
            required_columns: config
                .expected_columns
                .iter()
                .filter(|c| !config.is_date_column(c))
                .cloned()
                .collect(),
            float_columns: config.float_columns.clone(),
            ratio_columns: config.ratio_columns.clone(),
            integer_columns: config.int_columns.clone(),
            constant_columns: IndexMap::new(),
            session_max: config.roles.session_length_max.clone(),
            session_mean: config.roles.session_length_mean.clone(),
        }
    }

    /// Pin `column` to `value` and exclude it from scaling.
    pub fn with_constant(mut self, column: impl Into<String>, value: f64) -> Self {
        self.constant_columns.insert(column.into(), value);
        self
    }

    /// Drop `column` from every group, e.g. a label that is split off
    /// before normalization.
    pub fn without_column(mut self, column: &str) -> Self {
        for group in [
            &mut self.required_columns,
            &mut self.float_columns,
            &mut self.ratio_columns,
            &mut self.integer_columns,
        ] {
            group.retain(|c| c != column);
        }
        self.constant_columns.shift_remove(column);
        self
    }

    pub fn is_constant(&self, column: &str) -> bool {
        self.constant_columns.contains_key(column)
    }

    /// Float, ratio, then integer columns, without constants or repeats.
    pub fn scalable_columns(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for column in self
            .float_columns
            .iter()
            .chain(&self.ratio_columns)
            .chain(&self.integer_columns)
        {
            if !self.is_constant(column) && !out.contains(&column.as_str()) {
                out.push(column);
            }
        }
        out
    }
}
