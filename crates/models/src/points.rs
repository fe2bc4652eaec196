use common::stats::mean;
use common::{PredictionPoint, Result, SalesError, Series, TrendLabel};

/// Zip per-step predictions with the dates following the series.
///
/// `confidence(step)` receives the 0-based step index.
pub(crate) fn assemble_points(
    series: &Series,
    predicted: &[f64],
    lower: &[f64],
    upper: &[f64],
    confidence: impl Fn(usize) -> f64,
) -> Result<Vec<PredictionPoint>> {
    if lower.len() != predicted.len() || upper.len() != predicted.len() {
        return Err(SalesError::ModelError(format!(
            "bound lengths {}/{} do not match {} predictions",
            lower.len(),
            upper.len(),
            predicted.len()
        )));
    }

    let historical_mean = mean(series.values());
    let dates = series.future_dates(predicted.len())?;

    Ok(dates
        .into_iter()
        .enumerate()
        .map(|(step, date)| PredictionPoint {
            date,
            predicted_value: predicted[step],
            lower_bound: lower[step],
            upper_bound: upper[step],
            confidence: confidence(step),
            trend_label: TrendLabel::relative_to(predicted[step], historical_mean),
        })
        .collect())
}

/// Confidence starting at `start` and losing `decay` per step, floored at 0.
pub(crate) fn linear_decay(start: f64, decay: f64) -> impl Fn(usize) -> f64 {
    move |step| (start - decay * step as f64).max(0.0)
}
