use augurs::ets::AutoETS;
use augurs::mstl::MSTLModel;
use augurs::prelude::*;
use augurs::Forecast;
use common::metrics::{mape, rmse};
use common::{
    AccuracyMetrics, ForecastConfig, ForecastResult, ForecastTechnique, Result, SalesError,
    Series, TechniqueTier,
};
use tracing::debug;

use crate::points::assemble_points;

/// Weekly and yearly cycles of daily sales.
const DEFAULT_PERIODS: [usize; 2] = [7, 365];
const CONFIDENCE: f64 = 0.85;

/// Trend plus weekly/yearly seasonality: MSTL decomposition with an AutoETS
/// trend model.
///
/// Only periods shorter than half the series are decomposed; with none left
/// the series is fitted by AutoETS directly. Bounds come from the model's
/// prediction intervals and, like the point forecast, are floored at 0.
/// `mape` and `rmse` are measured on the in-sample fit.
pub struct SeasonalTrendTechnique {
    periods: Vec<usize>,
    min_points: usize,
    level: f64,
}

impl SeasonalTrendTechnique {
    pub fn new(periods: Vec<usize>, min_points: usize, level: f64) -> Self {
        let periods = periods.into_iter().filter(|&p| p > 1).collect();
        Self {
            periods,
            min_points,
            level,
        }
    }

    pub fn from_config(config: &ForecastConfig) -> Self {
        Self::new(
            DEFAULT_PERIODS.to_vec(),
            config.seasonal_min_points,
            config.interval_level,
        )
    }

    fn valid_periods(&self, n: usize) -> Vec<usize> {
        self.periods
            .iter()
            .copied()
            .filter(|&p| p < n / 2)
            .collect()
    }

    /// Out-of-sample forecast plus the in-sample fit, when available.
    fn fit_and_forecast(
        &self,
        values: &[f64],
        horizon: usize,
    ) -> Result<(Forecast, Option<Forecast>)> {
        let n = values.len();
        let periods = self.valid_periods(n);

        if periods.is_empty() {
            debug!(data_length = n, "No valid seasonal periods, fitting AutoETS");
            let fitted = AutoETS::new(1, "ZZN")
                .map_err(|e| SalesError::ModelError(format!("ETS init: {e}")))?
                .fit(values)
                .map_err(|e| SalesError::ModelError(format!("ETS fit: {e}")))?;
            return forecast_with(&fitted, horizon, self.level);
        }

        debug!(periods = ?periods, data_length = n, horizon = horizon, "MSTL fitting");
        let trend_model = AutoETS::new(1, "ZZN")
            .map_err(|e| SalesError::ModelError(format!("MSTL ETS init: {e}")))?
            .into_trend_model();
        let fitted = MSTLModel::new(periods, trend_model)
            .fit(values)
            .map_err(|e| SalesError::ModelError(format!("MSTL fit: {e}")))?;
        forecast_with(&fitted, horizon, self.level)
    }
}

impl Default for SeasonalTrendTechnique {
    fn default() -> Self {
        Self::from_config(&ForecastConfig::default())
    }
}

fn forecast_with<P>(
    fitted: &P,
    horizon: usize,
    level: f64,
) -> Result<(Forecast, Option<Forecast>)>
where
    P: Predict,
    P::Error: std::fmt::Display,
{
    let forecast = fitted
        .predict(horizon, level)
        .map_err(|e| SalesError::ModelError(format!("predict: {e}")))?;
    let in_sample = match fitted.predict_in_sample(level) {
        Ok(f) => Some(f),
        Err(e) => {
            debug!(error = %e, "In-sample fit unavailable");
            None
        }
    };
    Ok((forecast, in_sample))
}

impl ForecastTechnique for SeasonalTrendTechnique {
    fn name(&self) -> &str {
        "seasonal_trend"
    }

    fn tier(&self) -> TechniqueTier {
        TechniqueTier::SeasonalTrend
    }

    fn is_suitable(&self, series: &Series) -> bool {
        series.len() >= self.min_points.max(3)
    }

    fn predict(&self, series: &Series, horizon: usize) -> Result<ForecastResult> {
        let values = series.values();
        if values.len() < self.min_points.max(3) {
            return Err(SalesError::InsufficientData(format!(
                "seasonal trend requires at least {} data points",
                self.min_points.max(3)
            )));
        }

        let (forecast, in_sample) = self.fit_and_forecast(values, horizon)?;

        let predicted: Vec<f64> = forecast.point.iter().map(|v| v.max(0.0)).collect();
        let (lower, upper) = match &forecast.intervals {
            Some(iv) => (
                iv.lower.iter().map(|v| v.max(0.0)).collect(),
                iv.upper.iter().map(|v| v.max(0.0)).collect(),
            ),
            None => (predicted.clone(), predicted.clone()),
        };

        let (fit_mape, fit_rmse) = match &in_sample {
            Some(fit) if fit.point.len() == values.len() => {
                (mape(&fit.point, values), rmse(&fit.point, values))
            }
            _ => (None, None),
        };

        let points = assemble_points(series, &predicted, &lower, &upper, |_| CONFIDENCE)?;

        Ok(ForecastResult {
            model_name: self.name().into(),
            points,
            accuracy_metrics: AccuracyMetrics {
                mape: fit_mape,
                rmse: fit_rmse,
                model_confidence: CONFIDENCE,
                samples_evaluated: values.len(),
            },
            target_column: None,
            generated_with_fallback: false,
        })
    }
}
