use std::sync::Arc;

use chrono::{Datelike, NaiveDate};
use common::metrics::{mape, rmse};
use common::stats::{mean, std_dev};
use common::{
    AccuracyMetrics, ForecastConfig, ForecastResult, ForecastTechnique, Result,
    SalesError, Series, TechniqueTier,
};
use tracing::debug;

use crate::points::assemble_points;

/// Column order of every feature row.
pub const FEATURE_NAMES: [&str; 9] = [
    "lag_1",
    "lag_7",
    "lag_14",
    "rolling_mean_7",
    "rolling_std_7",
    "day_of_week",
    "month",
    "day_of_month",
    "time_index",
];

/// Longest lag; the first row with a complete feature set.
const MAX_LAG: usize = 14;
const ROLLING_WINDOW: usize = 7;
/// z-score of an 80 % two-sided interval.
const INTERVAL_Z: f64 = 1.28;
const CONFIDENCE: f64 = 0.80;

/// A trainable tabular regressor, e.g. a gradient-boosted tree ensemble.
pub trait FeatureRegressor: Send + Sync {
    fn name(&self) -> &str;

    /// Fit on row-major `features` (columns as in [`FEATURE_NAMES`]).
    fn fit(&self, features: &[Vec<f64>], targets: &[f64]) -> Result<Box<dyn FittedRegressor>>;
}

pub trait FittedRegressor: Send + Sync {
    fn predict(&self, features: &[f64]) -> Result<f64>;
}

/// Recursive multi-step forecast from lag, rolling and calendar features.
///
/// Each future day is predicted from features over the history extended by
/// the predictions already made. Unsuitable until a [`FeatureRegressor`] is
/// registered.
pub struct GradientBoostedTechnique {
    regressor: Option<Arc<dyn FeatureRegressor>>,
    min_points: usize,
}

impl GradientBoostedTechnique {
    pub fn new(regressor: Option<Arc<dyn FeatureRegressor>>, min_points: usize) -> Self {
        Self {
            regressor,
            min_points: min_points.max(MAX_LAG + 1),
        }
    }

    pub fn from_config(
        config: &ForecastConfig,
        regressor: Option<Arc<dyn FeatureRegressor>>,
    ) -> Self {
        Self::new(regressor, config.boosted_min_points)
    }

    pub fn has_regressor(&self) -> bool {
        self.regressor.is_some()
    }
}

/// Features describing day `t`, computed only from `history[..t]`.
fn feature_row(history: &[f64], t: usize, date: NaiveDate) -> Vec<f64> {
    let window = &history[t - ROLLING_WINDOW..t];
    vec![
        history[t - 1],
        history[t - 7],
        history[t - 14],
        mean(window),
        std_dev(window),
        date.weekday().num_days_from_monday() as f64,
        date.month() as f64,
        date.day() as f64,
        t as f64,
    ]
}

impl ForecastTechnique for GradientBoostedTechnique {
    fn name(&self) -> &str {
        "gradient_boosted"
    }

    fn tier(&self) -> TechniqueTier {
        TechniqueTier::GradientBoosted
    }

    fn is_suitable(&self, series: &Series) -> bool {
        self.regressor.is_some() && series.len() >= self.min_points
    }

    fn predict(&self, series: &Series, horizon: usize) -> Result<ForecastResult> {
        let regressor = self.regressor.as_ref().ok_or_else(|| {
            SalesError::TechniqueUnavailable("no feature regressor registered".into())
        })?;
        let values = series.values();
        let dates = series.dates();
        if values.len() < self.min_points {
            return Err(SalesError::InsufficientData(format!(
                "gradient boosted forecast requires at least {} data points",
                self.min_points
            )));
        }

        let features: Vec<Vec<f64>> = (MAX_LAG..values.len())
            .map(|t| feature_row(values, t, dates[t]))
            .collect();
        let targets = &values[MAX_LAG..];

        debug!(
            regressor = regressor.name(),
            rows = features.len(),
            "Fitting feature regressor"
        );
        let fitted = regressor.fit(&features, targets)?;

        let in_sample = features
            .iter()
            .map(|row| fitted.predict(row))
            .collect::<Result<Vec<f64>>>()?;
        let residuals: Vec<f64> = targets.iter().zip(&in_sample).map(|(a, f)| a - f).collect();
        let spread = INTERVAL_Z * std_dev(&residuals);

        let future_dates = series.future_dates(horizon)?;
        let mut history = values.to_vec();
        let mut predicted = Vec::with_capacity(horizon);
        for date in future_dates {
            let t = history.len();
            let raw = fitted.predict(&feature_row(&history, t, date))?;
            if !raw.is_finite() {
                return Err(SalesError::ModelError(format!(
                    "regressor produced {raw} on {date}"
                )));
            }
            let value = raw.max(0.0);
            history.push(value);
            predicted.push(value);
        }
        let lower: Vec<f64> = predicted.iter().map(|p| (p - spread).max(0.0)).collect();
        let upper: Vec<f64> = predicted.iter().map(|p| p + spread).collect();

        let points = assemble_points(series, &predicted, &lower, &upper, |_| CONFIDENCE)?;

        Ok(ForecastResult {
            model_name: self.name().into(),
            points,
            accuracy_metrics: AccuracyMetrics {
                mape: mape(&in_sample, targets),
                rmse: rmse(&in_sample, targets),
                model_confidence: CONFIDENCE,
                samples_evaluated: targets.len(),
            },
            target_column: None,
            generated_with_fallback: false,
        })
    }
}

#[cfg(test)]
mod tests;
