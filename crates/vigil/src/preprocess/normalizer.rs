//! Fit/transform normalizer with frozen scaling statistics.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{Result, VigilError};
use crate::table::{FeatureTable, Value};
use crate::validation::to_number;

use super::config::NormalizerConfig;
use super::stats::{mean, median, population_std};

/// Learned standardization parameters for one column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScalingParams {
    pub mean: f64,
    pub std: f64,
}

impl ScalingParams {
    /// `(value - mean) / std`, or 0.0 when the fitted std is zero.
    pub fn apply(&self, value: f64) -> f64 {
        if self.std == 0.0 {
            0.0
        } else {
            (value - self.mean) / self.std
        }
    }
}

/// Statistics learned by `fit_transform`, reused verbatim by `transform`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedNormalizerState {
    pub scaled_columns: Vec<String>,
    pub params: IndexMap<String, ScalingParams>,
}

/// Cleans and standardizes feature tables.
///
/// The first `fit_transform` freezes the scaling statistics; every later
/// `transform` applies them unchanged. Imputation medians are the one
/// exception and are always taken from the batch being processed.
#[derive(Debug, Clone)]
pub struct Normalizer {
    config: NormalizerConfig,
    state: Option<FittedNormalizerState>,
}

impl Normalizer {
    pub fn new(config: NormalizerConfig) -> Self {
        Self {
            config,
            state: None,
        }
    }

    /// Rebuild a fitted normalizer from persisted state.
    pub fn from_state(config: NormalizerConfig, state: FittedNormalizerState) -> Self {
        Self {
            config,
            state: Some(state),
        }
    }

    pub fn config(&self) -> &NormalizerConfig {
        &self.config
    }

    pub fn state(&self) -> Option<&FittedNormalizerState> {
        self.state.as_ref()
    }

    pub fn is_fitted(&self) -> bool {
        self.state.is_some()
    }

    /// Clean `table`, learn scaling statistics from it and scale it.
    pub fn fit_transform(
        &mut self,
        table: &FeatureTable,
    ) -> Result<(FeatureTable, FittedNormalizerState)> {
        if self.state.is_some() {
            return Err(VigilError::AlreadyFitted);
        }
        if table.is_empty() {
            return Err(VigilError::EmptyData(
                "cannot fit a normalizer on an empty table".to_string(),
            ));
        }

        let mut prepared = self.prepare(table)?;

        let mut params = IndexMap::new();
        for column in self.config.scalable_columns() {
            let Some(col) = prepared.column_index(column) else {
                continue;
            };
            let values: Vec<f64> = prepared.column_values(col).filter_map(Value::as_f64).collect();
            let m = mean(&values);
            params.insert(
                column.to_string(),
                ScalingParams {
                    mean: m,
                    std: population_std(&values, m),
                },
            );
        }

        let state = FittedNormalizerState {
            scaled_columns: params.keys().cloned().collect(),
            params,
        };
        scale(&mut prepared, &state)?;

        tracing::info!(
            rows = prepared.row_count(),
            scaled_columns = state.scaled_columns.len(),
            "Normalizer fitted"
        );

        self.state = Some(state.clone());
        Ok((prepared, state))
    }

    /// Clean `table` and scale it with the frozen statistics.
    pub fn transform(&self, table: &FeatureTable) -> Result<FeatureTable> {
        let state = self.state.as_ref().ok_or(VigilError::NotFitted)?;
        let mut prepared = self.prepare(table)?;
        scale(&mut prepared, state)?;

        tracing::debug!(rows = prepared.row_count(), "Normalizer transform");
        Ok(prepared)
    }

    /// Everything up to, but not including, standardization.
    fn prepare(&self, table: &FeatureTable) -> Result<FeatureTable> {
        let config = &self.config;

        let missing: Vec<String> = config
            .required_columns
            .iter()
            .filter(|c| !table.has_column(c))
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(VigilError::MissingColumns { columns: missing });
        }

        let mut out = table.clone();

        let numeric = config
            .float_columns
            .iter()
            .chain(&config.ratio_columns)
            .chain(&config.integer_columns);
        for column in numeric {
            if let Some(col) = out.column_index(column) {
                out.map_column(col, |_, v| to_number(v).into_value());
            }
        }

        for column in &config.float_columns {
            if let Some(col) = out.column_index(column) {
                let fill = batch_median(&out, col);
                out.map_column(col, |_, v| match v {
                    Value::Null => Value::Float(fill),
                    other => other.clone(),
                });
            }
        }

        for column in &config.integer_columns {
            if let Some(col) = out.column_index(column) {
                let fill = batch_median(&out, col).round_ties_even();
                out.map_column(col, |_, v| {
                    let n = v.as_f64().unwrap_or(fill);
                    Value::Int(n.round_ties_even() as i64)
                });
            }
        }

        for column in &config.ratio_columns {
            if let Some(col) = out.column_index(column) {
                out.map_column(col, |_, v| {
                    Value::Float(v.as_f64().unwrap_or(0.0).clamp(0.0, 1.0))
                });
            }
        }

        swap_inverted_sessions(&mut out, &config.session_max, &config.session_mean);

        for (column, constant) in &config.constant_columns {
            if let Some(col) = out.column_index(column) {
                out.map_column(col, |_, _| Value::Float(*constant));
            }
        }

        Ok(out)
    }
}

/// Median of the non-null cells, or 0.0 when there are none.
fn batch_median(table: &FeatureTable, col: usize) -> f64 {
    let values: Vec<f64> = table.column_values(col).filter_map(Value::as_f64).collect();
    median(&values).unwrap_or(0.0)
}

fn swap_inverted_sessions(table: &mut FeatureTable, max_column: &str, mean_column: &str) {
    let (Some(max_col), Some(mean_col)) =
        (table.column_index(max_column), table.column_index(mean_column))
    else {
        return;
    };

    let mut swapped = 0usize;
    for row in 0..table.row_count() {
        let max = table.cell(row, max_col).cloned().unwrap_or(Value::Null);
        let mean = table.cell(row, mean_col).cloned().unwrap_or(Value::Null);
        if let (Some(a), Some(b)) = (max.as_f64(), mean.as_f64()) {
            if a < b {
                table.set(row, max_col, mean);
                table.set(row, mean_col, max);
                swapped += 1;
            }
        }
    }

    if swapped > 0 {
        tracing::debug!(rows = swapped, "Swapped session max and mean");
    }
}

fn scale(table: &mut FeatureTable, state: &FittedNormalizerState) -> Result<()> {
    let missing: Vec<String> = state
        .scaled_columns
        .iter()
        .filter(|c| !table.has_column(c))
        .cloned()
        .collect();
    if !missing.is_empty() {
        return Err(VigilError::MissingColumns { columns: missing });
    }

    for (column, params) in &state.params {
        if let Some(col) = table.column_index(column) {
            table.map_column(col, |_, v| match v.as_f64() {
                Some(x) => Value::Float(params.apply(x)),
                None => Value::Float(0.0),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const COLUMNS: [&str; 10] = [
        "total_usage_daily",
        "total_usage_weekly",
        "late_night_ratio",
        "sns_ent_ratio",
        "session_length_max",
        "session_length_mean",
        "bounce_ratio",
        "avg_tab_cnt",
        "search_freq",
        "repeat_site_ratio",
    ];

    fn table(rows: Vec<[Value; 10]>) -> FeatureTable {
        FeatureTable::from_rows(COLUMNS, rows.into_iter().map(|r| r.to_vec()).collect())
    }

    fn row(daily: f64, max: f64, mean: f64, ratio: Value, search: Value) -> [Value; 10] {
        [
            Value::Float(daily),
            Value::Float(daily * 7.0),
            ratio,
            Value::Float(0.2),
            Value::Float(max),
            Value::Float(mean),
            Value::Float(0.1),
            Value::Float(9.0),
            search,
            Value::Float(0.5),
        ]
    }

    #[test]
    fn test_transform_before_fit_fails() {
        let normalizer = Normalizer::new(NormalizerConfig::features_daily());
        let t = table(vec![row(1.0, 5.0, 2.0, Value::Float(0.3), Value::Int(2))]);
        assert!(matches!(normalizer.transform(&t), Err(VigilError::NotFitted)));
    }

    #[test]
    fn test_second_fit_fails() {
        let mut normalizer = Normalizer::new(NormalizerConfig::features_daily());
        let t = table(vec![row(1.0, 5.0, 2.0, Value::Float(0.3), Value::Int(2))]);
        normalizer.fit_transform(&t).unwrap();
        assert!(matches!(normalizer.fit_transform(&t), Err(VigilError::AlreadyFitted)));
    }

    #[test]
    fn test_missing_required_column() {
        let mut normalizer = Normalizer::new(NormalizerConfig::features_daily());
        let t = FeatureTable::from_rows(["total_usage_daily"], vec![vec![Value::Float(1.0)]]);
        match normalizer.fit_transform(&t) {
            Err(VigilError::MissingColumns { columns }) => assert_eq!(columns.len(), 9),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_swap_and_constant_before_scaling() {
        let normalizer = Normalizer::new(NormalizerConfig::features_daily());
        let t = table(vec![row(1.0, 2.0, 5.0, Value::Float(0.3), Value::Int(2))]);
        let prepared = normalizer.prepare(&t).unwrap();

        assert_eq!(prepared.get(0, "session_length_max"), Some(&Value::Float(5.0)));
        assert_eq!(prepared.get(0, "session_length_mean"), Some(&Value::Float(2.0)));
        assert_eq!(prepared.get(0, "avg_tab_cnt"), Some(&Value::Float(0.0)));
    }

    #[test]
    fn test_imputation_rules() {
        let normalizer = Normalizer::new(NormalizerConfig::features_daily());
        let t = table(vec![
            row(1.0, 5.0, 2.0, Value::Null, Value::Int(1)),
            row(3.0, 5.0, 2.0, Value::Float(1.7), Value::Null),
            row(8.0, 5.0, 2.0, Value::from("-0.4"), Value::Int(4)),
        ]);
        let prepared = normalizer.prepare(&t).unwrap();

        assert_eq!(prepared.get(0, "late_night_ratio"), Some(&Value::Float(0.0)));
        assert_eq!(prepared.get(1, "late_night_ratio"), Some(&Value::Float(1.0)));
        assert_eq!(prepared.get(2, "late_night_ratio"), Some(&Value::Float(0.0)));
        // median of 1 and 4 is 2.5, rounded half to even
        assert_eq!(prepared.get(1, "search_freq"), Some(&Value::Int(2)));
    }

    #[test]
    fn test_constant_column_scales_to_zero() {
        let config = NormalizerConfig::features_daily();
        let mut normalizer = Normalizer::new(config);
        let t = table(vec![
            row(7.0, 5.0, 2.0, Value::Float(0.3), Value::Int(2)),
            row(7.0, 6.0, 2.0, Value::Float(0.4), Value::Int(3)),
        ]);
        let (out, state) = normalizer.fit_transform(&t).unwrap();

        assert_eq!(state.params["total_usage_daily"].std, 0.0);
        assert_eq!(out.get(0, "total_usage_daily"), Some(&Value::Float(0.0)));

        let other = table(vec![row(100.0, 5.0, 2.0, Value::Float(0.3), Value::Int(2))]);
        let scaled = normalizer.transform(&other).unwrap();
        assert_eq!(scaled.get(0, "total_usage_daily"), Some(&Value::Float(0.0)));
    }

    #[test]
    fn test_inexact_constant_scales_to_zero() {
        let mut normalizer = Normalizer::new(NormalizerConfig::features_daily());
        let t = table(
            (0..3)
                .map(|i| row(10.0 + i as f64, 5.0, 2.0, Value::Float(0.1), Value::Int(i)))
                .collect(),
        );
        let (out, state) = normalizer.fit_transform(&t).unwrap();

        assert_eq!(state.params["late_night_ratio"].std, 0.0);
        for r in 0..3 {
            assert_eq!(out.get(r, "late_night_ratio"), Some(&Value::Float(0.0)));
        }
    }

    #[test]
    fn test_transform_reuses_fitted_statistics() {
        let mut normalizer = Normalizer::new(NormalizerConfig::features_daily());
        let train = table(vec![
            row(2.0, 5.0, 2.0, Value::Float(0.3), Value::Int(2)),
            row(4.0, 5.0, 2.0, Value::Float(0.3), Value::Int(2)),
        ]);
        let (_, state) = normalizer.fit_transform(&train).unwrap();
        assert_eq!(state.params["total_usage_daily"], ScalingParams { mean: 3.0, std: 1.0 });

        let test = table(vec![row(5.0, 5.0, 2.0, Value::Float(0.3), Value::Int(2))]);
        let scaled = normalizer.transform(&test).unwrap();
        assert_eq!(scaled.get(0, "total_usage_daily"), Some(&Value::Float(2.0)));
    }

    #[test]
    fn test_from_state_matches_original() {
        let config = NormalizerConfig::features_daily();
        let mut normalizer = Normalizer::new(config.clone());
        let train = table(vec![
            row(2.0, 5.0, 2.0, Value::Float(0.3), Value::Int(2)),
            row(4.0, 9.0, 1.0, Value::Float(0.6), Value::Int(5)),
        ]);
        let (_, state) = normalizer.fit_transform(&train).unwrap();

        let restored = Normalizer::from_state(config, state);
        assert_eq!(
            restored.transform(&train).unwrap(),
            normalizer.transform(&train).unwrap()
        );
    }
}
