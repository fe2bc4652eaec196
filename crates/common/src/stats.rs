//! Descriptive statistics shared by the validation gate, the normalizer and
//! the metrics engine.
//!
//! Standard deviations use the sample (n − 1) estimator. Quartiles are
//! taken from actual data points, on the outer side of the interpolated rank.

use tracing::warn;

/// Default multiplier applied to the interquartile range.
pub const IQR_MULTIPLIER: f64 = 1.5;

/// Consistency score reported when it cannot be computed.
pub const DEFAULT_CONSISTENCY: f64 = 0.5;

pub fn mean(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    data.iter().sum::<f64>() / data.len() as f64
}

/// Sample standard deviation; 0 for fewer than two points.
pub fn std_dev(data: &[f64]) -> f64 {
    if data.len() < 2 {
        return 0.0;
    }
    let m = mean(data);
    let var = data.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (data.len() - 1) as f64;
    var.sqrt()
}

pub fn sorted_copy(data: &[f64]) -> Vec<f64> {
    let mut sorted = data.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    sorted
}

/// `(Q1, Q3)` of pre-sorted data as order statistics: Q1 is the data point
/// at or below the 25th-percentile rank, Q3 the one at or above the
/// 75th-percentile rank.
///
/// Fences built from them never lie inside the quartiles, so clamping
/// values to the fences leaves both quartiles, and therefore the fences,
/// unchanged.
pub fn quartiles(sorted: &[f64]) -> Option<(f64, f64)> {
    let last = sorted.len().checked_sub(1)?;
    let q1_rank = 0.25 * last as f64;
    let q3_rank = 0.75 * last as f64;
    Some((sorted[q1_rank.floor() as usize], sorted[q3_rank.ceil() as usize]))
}

/// Outlier fences `(Q1 − k·IQR, Q3 + k·IQR)`; `None` for empty input.
pub fn iqr_bounds(data: &[f64], multiplier: f64) -> Option<(f64, f64)> {
    let (q1, q3) = quartiles(&sorted_copy(data))?;
    let iqr = q3 - q1;
    Some((q1 - multiplier * iqr, q3 + multiplier * iqr))
}

/// Number of values strictly outside the IQR fences.
pub fn outlier_count(data: &[f64], multiplier: f64) -> usize {
    match iqr_bounds(data, multiplier) {
        Some((lower, upper)) => data.iter().filter(|&&v| v < lower || v > upper).count(),
        None => 0,
    }
}

/// `0.6·max(0, 1 − CV) + 0.4·max(0, 1 − 2·outlier_ratio)`.
///
/// CV counts as 1 when the mean is not positive. Returns
/// [`DEFAULT_CONSISTENCY`] for fewer than two values or a non-finite result.
pub fn consistency_score(data: &[f64]) -> f64 {
    if data.len() < 2 {
        return DEFAULT_CONSISTENCY;
    }

    let m = mean(data);
    let cv = if m > 0.0 { std_dev(data) / m } else { 1.0 };
    let outlier_ratio = outlier_count(data, IQR_MULTIPLIER) as f64 / data.len() as f64;

    let cv_score = (1.0 - cv).max(0.0);
    let outlier_score = (1.0 - outlier_ratio * 2.0).max(0.0);
    let score = cv_score * 0.6 + outlier_score * 0.4;

    if score.is_finite() {
        score
    } else {
        warn!(cv = cv, outlier_ratio = outlier_ratio, "Consistency score not finite, using default");
        DEFAULT_CONSISTENCY
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_sample_std_dev() {
        assert_eq!(std_dev(&[5.0]), 0.0);
        // Sample std of [2, 4, 4, 4, 5, 5, 7, 9] is sqrt(32 / 7)
        let data = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_relative_eq!(std_dev(&data), (32.0f64 / 7.0).sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn test_quartiles_are_data_points() {
        assert_eq!(quartiles(&[1.0, 2.0, 3.0, 4.0]), Some((1.0, 4.0)));
        assert_eq!(quartiles(&[1.0, 2.0, 3.0, 4.0, 5.0]), Some((2.0, 4.0)));
        assert_eq!(quartiles(&[7.0]), Some((7.0, 7.0)));
        assert_eq!(quartiles(&[]), None);
    }

    #[test]
    fn test_iqr_bounds() {
        let (lower, upper) = iqr_bounds(&[5.0, 1.0, 3.0, 2.0, 4.0], 1.5).unwrap();
        assert_relative_eq!(lower, 2.0 - 1.5 * 2.0);
        assert_relative_eq!(upper, 4.0 + 1.5 * 2.0);
        assert!(iqr_bounds(&[], 1.5).is_none());
    }

    #[test]
    fn test_clamping_to_fences_keeps_fences() {
        let mut data = vec![0.0, 0.0, 0.0, 0.0, 0.0, 100.0];
        assert_eq!(outlier_count(&data, 1.5), 1);
        let (lower, upper) = iqr_bounds(&data, 1.5).unwrap();
        for v in data.iter_mut() {
            *v = v.clamp(lower, upper);
        }
        assert_eq!(iqr_bounds(&data, 1.5), Some((lower, upper)));
        assert_eq!(outlier_count(&data, 1.5), 0);
    }

    #[test]
    fn test_outlier_count() {
        let mut data = vec![10.0; 19];
        data.push(1000.0);
        data[0] = 9.0;
        data[1] = 11.0;
        assert_eq!(outlier_count(&data, 1.5), 3);
    }

    #[test]
    fn test_consistency_constant_series() {
        assert_relative_eq!(consistency_score(&[100.0; 10]), 1.0);
    }

    #[test]
    fn test_consistency_short_series_default() {
        assert_eq!(consistency_score(&[1.0]), DEFAULT_CONSISTENCY);
        assert_eq!(consistency_score(&[]), DEFAULT_CONSISTENCY);
    }

    #[test]
    fn test_consistency_non_positive_mean() {
        // CV treated as 1 → cv component contributes nothing
        let score = consistency_score(&[0.0, 0.0, 0.0]);
        assert_relative_eq!(score, 0.4);
    }
}
