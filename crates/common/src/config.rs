use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{Result, SalesError};

/// Application-level configuration. Every field has a serde default, so a
/// partial JSON document (or `{}`) is a valid configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

impl AppConfig {
    pub fn from_json_str(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).map_err(|e| SalesError::ConfigError(e.to_string()))
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub detection: DetectionConfig,

    #[serde(default)]
    pub validation: ValidationConfig,

    #[serde(default)]
    pub normalization: NormalizationConfig,

    #[serde(default)]
    pub forecast: ForecastConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionConfig {
    /// Number of leading non-missing cells parsed when probing a date column.
    #[serde(default = "default_sample_size")]
    pub sample_size: usize,
    /// First day of a synthesized daily axis.
    #[serde(default = "default_synthetic_epoch")]
    pub synthetic_epoch: NaiveDate,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            sample_size: default_sample_size(),
            synthetic_epoch: default_synthetic_epoch(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
    #[serde(default = "default_min_rows")]
    pub min_rows: usize,
    #[serde(default = "default_min_span_days")]
    pub min_span_days: i64,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            min_rows: default_min_rows(),
            min_span_days: default_min_span_days(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizationConfig {
    #[serde(default = "default_iqr_multiplier")]
    pub iqr_multiplier: f64,
    /// Widest first-to-last date range reindexed into a daily series.
    #[serde(default = "default_max_span_days")]
    pub max_span_days: i64,
}

impl Default for NormalizationConfig {
    fn default() -> Self {
        Self {
            iqr_multiplier: default_iqr_multiplier(),
            max_span_days: default_max_span_days(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastConfig {
    #[serde(default = "default_horizon")]
    pub default_horizon: usize,
    /// Operators may switch the seasonal tier off even when it is compiled in.
    #[serde(default = "default_true")]
    pub seasonal_enabled: bool,
    #[serde(default = "default_seasonal_min_points")]
    pub seasonal_min_points: usize,
    #[serde(default = "default_boosted_min_points")]
    pub boosted_min_points: usize,
    #[serde(default = "default_interval_level")]
    pub interval_level: f64,
    #[serde(default = "default_fallback_seed")]
    pub fallback_seed: u64,
    #[serde(default = "default_fallback_baseline")]
    pub fallback_baseline: f64,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            default_horizon: default_horizon(),
            seasonal_enabled: default_true(),
            seasonal_min_points: default_seasonal_min_points(),
            boosted_min_points: default_boosted_min_points(),
            interval_level: default_interval_level(),
            fallback_seed: default_fallback_seed(),
            fallback_baseline: default_fallback_baseline(),
        }
    }
}

fn default_sample_size() -> usize {
    10
}
fn default_synthetic_epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default()
}
fn default_min_rows() -> usize {
    30
}
fn default_min_span_days() -> i64 {
    30
}
fn default_iqr_multiplier() -> f64 {
    1.5
}
fn default_max_span_days() -> i64 {
    36_525
}
fn default_horizon() -> usize {
    90
}
fn default_true() -> bool {
    true
}
fn default_seasonal_min_points() -> usize {
    10
}
fn default_boosted_min_points() -> usize {
    50
}
fn default_interval_level() -> f64 {
    0.80
}
fn default_fallback_seed() -> u64 {
    42
}
fn default_fallback_baseline() -> f64 {
    50_000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = AppConfig::from_json_str("{}").unwrap();
        assert_eq!(config.pipeline.forecast.default_horizon, 90);
        assert_eq!(config.pipeline.detection.sample_size, 10);
        assert_eq!(
            config.pipeline.detection.synthetic_epoch,
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
        );
        assert!(config.pipeline.forecast.seasonal_enabled);
    }

    #[test]
    fn test_partial_document_overrides() {
        let raw = r#"{"pipeline": {"forecast": {"default_horizon": 14, "seasonal_enabled": false}}}"#;
        let config = AppConfig::from_json_str(raw).unwrap();
        assert_eq!(config.pipeline.forecast.default_horizon, 14);
        assert!(!config.pipeline.forecast.seasonal_enabled);
        assert_eq!(config.pipeline.forecast.boosted_min_points, 50);
        assert_eq!(config.pipeline.validation.min_rows, 30);
        assert_eq!(config.pipeline.normalization.max_span_days, 36_525);
    }

    #[test]
    fn test_malformed_document_is_config_error() {
        let err = AppConfig::from_json_str("{not json").unwrap_err();
        assert!(matches!(err, SalesError::ConfigError(_)));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = AppConfig::from_path("/nonexistent/salescast.json").unwrap_err();
        assert!(matches!(err, SalesError::Io(_)));
    }
}
