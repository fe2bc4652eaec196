use common::stats::mean;
use common::{
    AccuracyMetrics, ForecastResult, ForecastTechnique, Result, SalesError, Series, TechniqueTier,
};
use tracing::debug;

use crate::points::{assemble_points, linear_decay};

const WINDOW: usize = 7;
const DEFAULT_GROWTH: f64 = 0.02;
const BOUND_RATIO: f64 = 0.20;
const START_CONFIDENCE: f64 = 0.7;
const CONFIDENCE_DECAY: f64 = 0.005;
/// Days over which the recent weekly growth is applied in full.
const GROWTH_HORIZON_DAYS: f64 = 30.0;

/// Trailing-average baseline with a gradual growth trend.
///
/// The baseline is the mean of the last 7 days. The growth trend is the
/// relative change from the week before to the last week, or 2 % when
/// fewer than 14 days exist or the earlier week averaged 0 or less. Step
/// `i` (0-based) predicts `baseline · (1 + trend · i / 30)`.
///
/// Reports no measured error; `model_confidence` is a fixed 0.7.
pub struct NaiveTechnique;

impl NaiveTechnique {
    pub fn new() -> Self {
        Self
    }

    fn growth_trend(values: &[f64]) -> f64 {
        let n = values.len();
        if n < 2 * WINDOW {
            return DEFAULT_GROWTH;
        }
        let recent = mean(&values[n - WINDOW..]);
        let older = mean(&values[n - 2 * WINDOW..n - WINDOW]);
        if older > 0.0 {
            (recent - older) / older
        } else {
            DEFAULT_GROWTH
        }
    }
}

impl Default for NaiveTechnique {
    fn default() -> Self {
        Self::new()
    }
}

impl ForecastTechnique for NaiveTechnique {
    fn name(&self) -> &str {
        "naive"
    }

    fn tier(&self) -> TechniqueTier {
        TechniqueTier::Naive
    }

    fn is_suitable(&self, series: &Series) -> bool {
        !series.is_empty()
    }

    fn predict(&self, series: &Series, horizon: usize) -> Result<ForecastResult> {
        let values = series.values();
        if values.is_empty() {
            return Err(SalesError::InsufficientData(
                "naive forecast requires at least 1 data point".into(),
            ));
        }

        let n = values.len();
        let baseline = mean(&values[n.saturating_sub(WINDOW)..]);
        let trend = Self::growth_trend(values);
        if !baseline.is_finite() || !trend.is_finite() {
            return Err(SalesError::ModelError(format!(
                "naive baseline {baseline} or trend {trend} not finite"
            )));
        }

        debug!(
            baseline = format!("{:.2}", baseline),
            trend = format!("{:.4}", trend),
            horizon = horizon,
            "Naive forecasting"
        );

        let predicted: Vec<f64> = (0..horizon)
            .map(|step| (baseline * (1.0 + trend * step as f64 / GROWTH_HORIZON_DAYS)).max(0.0))
            .collect();
        let lower: Vec<f64> = predicted.iter().map(|p| p * (1.0 - BOUND_RATIO)).collect();
        let upper: Vec<f64> = predicted.iter().map(|p| p * (1.0 + BOUND_RATIO)).collect();

        let points = assemble_points(
            series,
            &predicted,
            &lower,
            &upper,
            linear_decay(START_CONFIDENCE, CONFIDENCE_DECAY),
        )?;

        Ok(ForecastResult {
            model_name: self.name().into(),
            points,
            accuracy_metrics: AccuracyMetrics {
                mape: None,
                rmse: None,
                model_confidence: START_CONFIDENCE,
                samples_evaluated: n,
            },
            target_column: None,
            generated_with_fallback: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn series(values: Vec<f64>) -> Series {
        Series::daily(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), values).unwrap()
    }

    #[test]
    fn test_short_history_uses_default_growth() {
        let s = series(vec![100.0; 10]);
        let result = NaiveTechnique::new().predict(&s, 31).unwrap();

        assert_eq!(result.points.len(), 31);
        assert_relative_eq!(result.points[0].predicted_value, 100.0);
        // 30 steps in, the default 2 % growth has fully applied.
        assert_relative_eq!(result.points[30].predicted_value, 102.0, epsilon = 1e-9);
        assert_relative_eq!(result.points[30].lower_bound, 81.6, epsilon = 1e-9);
        assert_relative_eq!(result.points[30].upper_bound, 122.4, epsilon = 1e-9);
        assert_eq!(
            result.points[0].date,
            NaiveDate::from_ymd_opt(2024, 1, 11).unwrap()
        );
    }

    #[test]
    fn test_weekly_growth_trend() {
        let mut values = vec![100.0; 7];
        values.extend(vec![110.0; 7]);
        let result = NaiveTechnique::new().predict(&series(values), 31).unwrap();

        assert_relative_eq!(result.points[0].predicted_value, 110.0);
        assert_relative_eq!(result.points[30].predicted_value, 121.0, epsilon = 1e-9);
        assert_eq!(result.points[30].trend_label, common::TrendLabel::Upward);
    }

    #[test]
    fn test_confidence_decays_and_floors() {
        let result = NaiveTechnique::new().predict(&series(vec![5.0; 3]), 200).unwrap();
        assert_relative_eq!(result.points[0].confidence, 0.7);
        assert_relative_eq!(result.points[10].confidence, 0.65, epsilon = 1e-12);
        assert_eq!(result.points[199].confidence, 0.0);
    }

    #[test]
    fn test_declining_sales_floor_at_zero() {
        let mut values = vec![100.0; 7];
        values.extend(vec![10.0; 7]);
        let result = NaiveTechnique::new().predict(&series(values), 90).unwrap();
        assert!(result.points.iter().all(|p| p.predicted_value >= 0.0));
        assert_eq!(result.points[89].predicted_value, 0.0);
    }

    #[test]
    fn test_accuracy_is_not_measured() {
        let result = NaiveTechnique::new().predict(&series(vec![1.0, 2.0]), 3).unwrap();
        assert_eq!(result.accuracy_metrics.mape, None);
        assert_eq!(result.accuracy_metrics.rmse, None);
        assert_eq!(result.accuracy_metrics.samples_evaluated, 2);
        assert_eq!(result.model_name, "naive");
    }

    #[test]
    fn test_empty_series_errors() {
        assert!(NaiveTechnique::new().predict(&Series::empty(), 3).is_err());
        assert!(!NaiveTechnique::new().is_suitable(&Series::empty()));
    }
}
