//! Validation schema configuration.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, VigilError};

/// Columns the cross-field rules bind to.
///
/// A rule only runs when every column it names is present in the table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnRoles {
    pub period_start: String,
    pub period_end: String,
    pub session_length_max: String,
    pub session_length_mean: String,
    pub total_usage_daily: String,
    pub total_usage_weekly: String,
}

impl Default for ColumnRoles {
    fn default() -> Self {
        Self {
            period_start: "period_start".to_string(),
            period_end: "period_end".to_string(),
            session_length_max: "session_length_max".to_string(),
            session_length_mean: "session_length_mean".to_string(),
            total_usage_daily: "total_usage_daily".to_string(),
            total_usage_weekly: "total_usage_weekly".to_string(),
        }
    }
}

/// Declared schema for one table variant.
///
/// Every group is a subset of `expected_columns`. A column listed in no
/// numeric or date group is opaque and skipped by the typed rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Required columns, in order.
    #[serde(default)]
    pub expected_columns: Vec<String>,
    /// Columns whose values must lie in [0, 1].
    #[serde(default)]
    pub ratio_columns: Vec<String>,
    /// Non-negative continuous columns.
    #[serde(default)]
    pub float_columns: Vec<String>,
    /// Non-negative whole-number columns.
    #[serde(default)]
    pub int_columns: Vec<String>,
    /// Calendar date columns.
    #[serde(default = "default_date_columns")]
    pub date_columns: Vec<String>,
    /// Column names used by the cross-field rules.
    #[serde(default)]
    pub roles: ColumnRoles,
}

fn default_date_columns() -> Vec<String> {
    vec!["period_start".to_string(), "period_end".to_string()]
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            expected_columns: Vec::new(),
            ratio_columns: Vec::new(),
            float_columns: Vec::new(),
            int_columns: Vec::new(),
            date_columns: default_date_columns(),
            roles: ColumnRoles::default(),
        }
    }
}

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

impl ValidationConfig {
    /// The `features_daily` table: one row of aggregated usage per user and day.
    pub fn features_daily() -> Self {
        Self {
            expected_columns: names(&[
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
            ]),
            ratio_columns: names(&[
                "late_night_ratio",
                "sns_ent_ratio",
                "bounce_ratio",
                "repeat_site_ratio",
            ]),
            float_columns: names(&[
                "total_usage_daily",
                "total_usage_weekly",
                "session_length_max",
                "session_length_mean",
                "avg_tab_cnt",
            ]),
            int_columns: names(&["search_freq"]),
            date_columns: Vec::new(),
            roles: ColumnRoles::default(),
        }
    }

    /// The period-based session table used for model training.
    pub fn weekly_sessions() -> Self {
        Self {
            expected_columns: names(&[
                "period_start",
                "period_end",
                "session_length_max",
                "session_length_mean",
                "avg_tab_cnt",
                "search_freq",
                "ad_click_rate",
            ]),
            ratio_columns: names(&["ad_click_rate"]),
            float_columns: names(&["session_length_max", "session_length_mean"]),
            int_columns: names(&["avg_tab_cnt", "search_freq"]),
            date_columns: default_date_columns(),
            roles: ColumnRoles::default(),
        }
    }

    /// Look up a built-in schema variant by name.
    pub fn preset(name: &str) -> Option<Self> {
        match name {
            "features_daily" => Some(Self::features_daily()),
            "weekly_sessions" => Some(Self::weekly_sessions()),
            _ => None,
        }
    }

    /// Parse a config from JSON text and check it.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.check()?;
        Ok(config)
    }

    /// Load a config from a JSON file and check it.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| VigilError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: Self = serde_json::from_reader(BufReader::new(file))?;
        config.check()?;
        Ok(config)
    }

    /// Ensure every numeric group only names expected columns.
    ///
    /// Date columns are exempt: the default pair applies only to tables
    /// that carry it.
    pub fn check(&self) -> Result<()> {
        let groups = [
            ("ratio_columns", &self.ratio_columns),
            ("float_columns", &self.float_columns),
            ("int_columns", &self.int_columns),
        ];

        for (group, columns) in groups {
            let stray: Vec<&str> = columns
                .iter()
                .filter(|c| !self.expected_columns.contains(*c))
                .map(String::as_str)
                .collect();
            if !stray.is_empty() {
                return Err(VigilError::Config(format!(
                    "{} lists columns not in expected_columns: {}",
                    group,
                    stray.join(", ")
                )));
            }
        }

        Ok(())
    }

    /// Columns subject to numeric coercion: float, ratio, then integer,
    /// without duplicates.
    pub fn numeric_columns(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for c in self
            .float_columns
            .iter()
            .chain(&self.ratio_columns)
            .chain(&self.int_columns)
        {
            if !out.contains(&c.as_str()) {
                out.push(c);
            }
        }
        out
    }

    /// Columns subject to the sign check: float, then integer.
    pub fn signed_columns(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for c in self.float_columns.iter().chain(&self.int_columns) {
            if !out.contains(&c.as_str()) {
                out.push(c);
            }
        }
        out
    }

    pub fn is_date_column(&self, name: &str) -> bool {
        self.date_columns.iter().any(|c| c == name)
    }

    /// Whether `name` belongs to a float, ratio or integer group.
    pub fn is_numeric_column(&self, name: &str) -> bool {
        self.float_columns
            .iter()
            .chain(&self.ratio_columns)
            .chain(&self.int_columns)
            .any(|c| c == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_are_consistent() {
        assert!(ValidationConfig::features_daily().check().is_ok());
        assert!(ValidationConfig::weekly_sessions().check().is_ok());
        assert!(ValidationConfig::preset("features_daily").is_some());
        assert!(ValidationConfig::preset("nope").is_none());
    }

    #[test]
    fn test_wire_shape_defaults() {
        let config = ValidationConfig::from_json_str(
            r#"{
                "expected_columns": ["period_start", "period_end", "a"],
                "float_columns": ["a"]
            }"#,
        )
        .unwrap();
        assert_eq!(config.date_columns, vec!["period_start", "period_end"]);
        assert!(config.ratio_columns.is_empty());
        assert_eq!(config.roles, ColumnRoles::default());
    }

    #[test]
    fn test_check_rejects_stray_columns() {
        let err = ValidationConfig::from_json_str(
            r#"{"expected_columns": ["a"], "ratio_columns": ["b"], "date_columns": []}"#,
        )
        .unwrap_err();
        assert!(matches!(err, VigilError::Config(msg) if msg.contains("ratio_columns")));
    }

    #[test]
    fn test_default_dates_need_not_be_expected() {
        let config =
            ValidationConfig::from_json_str(r#"{"expected_columns": ["a"], "float_columns": ["a"]}"#)
                .unwrap();
        assert!(config.is_date_column("period_start"));
    }

    #[test]
    fn test_numeric_columns_dedup() {
        let config = ValidationConfig {
            expected_columns: names(&["a", "b", "c"]),
            float_columns: names(&["a", "c"]),
            ratio_columns: names(&["b"]),
            int_columns: names(&["c"]),
            ..ValidationConfig::default()
        };
        assert_eq!(config.numeric_columns(), vec!["a", "c", "b"]);
        assert_eq!(config.signed_columns(), vec!["a", "c"]);
    }

    #[test]
    fn test_roles_override() {
        let config = ValidationConfig::from_json_str(
            r#"{
                "expected_columns": [],
                "date_columns": [],
                "roles": {"total_usage_daily": "usage_today"}
            }"#,
        )
        .unwrap();
        assert_eq!(config.roles.total_usage_daily, "usage_today");
        assert_eq!(config.roles.period_start, "period_start");
    }
}
