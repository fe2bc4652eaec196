/// Mean Absolute Percentage Error, in percent.
///
/// Only pairs with a strictly positive actual value contribute; returns
/// `None` when no such pair exists or the slices differ in length.
pub fn mape(fitted: &[f64], actual: &[f64]) -> Option<f64> {
    if fitted.len() != actual.len() {
        return None;
    }
    let (sum, count) = fitted
        .iter()
        .zip(actual)
        .filter(|(_, a)| **a > 0.0)
        .fold((0.0, 0usize), |(sum, count), (f, a)| {
            (sum + ((a - f) / a).abs(), count + 1)
        });
    if count == 0 {
        return None;
    }
    Some(sum / count as f64 * 100.0)
}

/// Root Mean Square Error; `None` for empty or mismatched slices.
pub fn rmse(fitted: &[f64], actual: &[f64]) -> Option<f64> {
    if fitted.len() != actual.len() || fitted.is_empty() {
        return None;
    }
    let mse = fitted
        .iter()
        .zip(actual)
        .map(|(f, a)| (f - a).powi(2))
        .sum::<f64>()
        / fitted.len() as f64;
    Some(mse.sqrt())
}
