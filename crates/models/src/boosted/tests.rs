use super::*;
use approx::assert_relative_eq;

/// Predicts the value one week earlier.
struct WeeklyLag;

struct FittedWeeklyLag;

impl FeatureRegressor for WeeklyLag {
    fn name(&self) -> &str {
        "weekly_lag"
    }

    fn fit(&self, features: &[Vec<f64>], targets: &[f64]) -> Result<Box<dyn FittedRegressor>> {
        assert_eq!(features.len(), targets.len());
        assert!(features.iter().all(|row| row.len() == FEATURE_NAMES.len()));
        Ok(Box::new(FittedWeeklyLag))
    }
}

impl FittedRegressor for FittedWeeklyLag {
    fn predict(&self, features: &[f64]) -> Result<f64> {
        Ok(features[1])
    }
}

struct Failing;

impl FeatureRegressor for Failing {
    fn name(&self) -> &str {
        "failing"
    }

    fn fit(&self, _: &[Vec<f64>], _: &[f64]) -> Result<Box<dyn FittedRegressor>> {
        Err(SalesError::ModelError("did not converge".into()))
    }
}

fn weekly_series(n: usize) -> Series {
    let pattern = [100.0, 120.0, 110.0, 130.0, 150.0, 200.0, 180.0];
    let values = (0..n).map(|i| pattern[i % 7]).collect();
    Series::daily(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), values).unwrap()
}

#[test]
fn test_feature_row_layout() {
    let history: Vec<f64> = (0..20).map(|i| i as f64).collect();
    // 2024-02-15 is a Thursday.
    let date = NaiveDate::from_ymd_opt(2024, 2, 15).unwrap();
    let row = feature_row(&history, 20, date);

    assert_eq!(row[0], 19.0);
    assert_eq!(row[1], 13.0);
    assert_eq!(row[2], 6.0);
    assert_relative_eq!(row[3], 16.0);
    assert!(row[4] > 0.0);
    assert_eq!(row[5], 3.0);
    assert_eq!(row[6], 2.0);
    assert_eq!(row[7], 15.0);
    assert_eq!(row[8], 20.0);
}

#[test]
fn test_recursive_forecast_repeats_week() {
    let series = weekly_series(70);
    let technique = GradientBoostedTechnique::new(Some(Arc::new(WeeklyLag)), 50);
    assert!(technique.is_suitable(&series));

    let result = technique.predict(&series, 14).unwrap();
    let predicted: Vec<f64> = result.points.iter().map(|p| p.predicted_value).collect();
    assert_eq!(predicted, series.values()[56..70].to_vec());

    assert_eq!(result.accuracy_metrics.mape, Some(0.0));
    assert_eq!(result.accuracy_metrics.samples_evaluated, 70 - MAX_LAG);
    // Perfect in-sample fit leaves no spread.
    assert_eq!(result.points[0].lower_bound, result.points[0].predicted_value);
    assert_eq!(result.points[0].confidence, CONFIDENCE);
}

#[test]
fn test_unsuitable_without_regressor() {
    let series = weekly_series(70);
    let technique = GradientBoostedTechnique::new(None, 50);
    assert!(!technique.is_suitable(&series));
    assert!(matches!(
        technique.predict(&series, 3),
        Err(SalesError::TechniqueUnavailable(_))
    ));
}

#[test]
fn test_min_points() {
    let technique = GradientBoostedTechnique::new(Some(Arc::new(WeeklyLag)), 50);
    assert!(!technique.is_suitable(&weekly_series(49)));
    assert!(technique.is_suitable(&weekly_series(50)));
}

#[test]
fn test_regressor_failure_propagates() {
    let technique = GradientBoostedTechnique::new(Some(Arc::new(Failing)), 50);
    assert!(technique.predict(&weekly_series(60), 5).is_err());
}
