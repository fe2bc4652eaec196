use common::stats::mean;
use statrs::distribution::{ContinuousCDF, StudentsT};

/// Ordinary least squares fit of `y` on `x`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
    /// Pearson correlation coefficient.
    pub r: f64,
    /// Two-sided p-value of the slope t-test.
    pub p_value: f64,
    pub std_err: f64,
}

/// Least squares regression with correlation and slope significance.
///
/// Returns `None` for fewer than two points, mismatched lengths, or when
/// either variable has no variance (the correlation is undefined).
pub fn linregress(x: &[f64], y: &[f64]) -> Option<LinearFit> {
    if x.len() != y.len() || x.len() < 2 {
        return None;
    }
    let n = x.len() as f64;
    let mx = mean(x);
    let my = mean(y);

    let ss_x: f64 = x.iter().map(|v| (v - mx).powi(2)).sum();
    let ss_y: f64 = y.iter().map(|v| (v - my).powi(2)).sum();
    let ss_xy: f64 = x.iter().zip(y).map(|(a, b)| (a - mx) * (b - my)).sum();

    if ss_x.abs() < 1e-15 || ss_y.abs() < 1e-15 {
        return None;
    }

    let slope = ss_xy / ss_x;
    let intercept = my - slope * mx;
    let r = (ss_xy / (ss_x * ss_y).sqrt()).clamp(-1.0, 1.0);
    if !r.is_finite() {
        return None;
    }

    let df = n - 2.0;
    let residual_ss: f64 = x
        .iter()
        .zip(y)
        .map(|(&xi, &yi)| (yi - (slope * xi + intercept)).powi(2))
        .sum();
    let std_err = (residual_ss / df.max(1.0) / ss_x).sqrt();
    let p_value = slope_p_value(slope, std_err, df);

    Some(LinearFit {
        slope,
        intercept,
        r,
        p_value,
        std_err,
    })
}

fn slope_p_value(slope: f64, std_err: f64, df: f64) -> f64 {
    if df < 1.0 {
        return 1.0;
    }
    if std_err <= 0.0 {
        // Perfect fit.
        return 0.0;
    }
    match StudentsT::new(0.0, 1.0, df) {
        Ok(dist) => 2.0 * (1.0 - dist.cdf((slope / std_err).abs())),
        Err(_) => 1.0,
    }
}
