use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate, Weekday};
use common::stats::{consistency_score, mean, std_dev, DEFAULT_CONSISTENCY};
use common::{MetricsSnapshot, PeakPeriods, Series};
use tracing::{debug, info};

use crate::regression::linregress;

/// Trend strength reported when no regression can be fitted.
const DEFAULT_TREND_STRENGTH: f64 = 0.5;
const MOMENTUM_WINDOW: usize = 7;
const MAX_PREDICTION_CONFIDENCE: f64 = 0.95;
/// History length at which the data-volume term of the confidence saturates.
const FULL_CONFIDENCE_DAYS: f64 = 90.0;
const PEAK_MONTHS: usize = 3;
const PEAK_WEEKDAYS: usize = 2;

/// Derives the business indicators of a normalized daily series.
///
/// Every indicator has a defined fallback, so [`MetricsEngine::compute`]
/// never fails, including on empty and single-point series.
pub struct MetricsEngine;

impl MetricsEngine {
    pub fn new() -> Self {
        Self
    }

    pub fn compute(&self, series: &Series) -> MetricsSnapshot {
        let values = series.values();

        let total_days = values.len();
        let average_daily_sales = mean(values);
        let sales_std_dev = std_dev(values);
        let volatility = self.volatility(values);
        let trend_strength = self.trend_strength(values);
        let consistency = if values.len() < 2 {
            DEFAULT_CONSISTENCY
        } else {
            consistency_score(values)
        };

        let monthly = grouped_means(series, |d| d.month());
        let weekly = grouped_means(series, |d| d.weekday().num_days_from_monday());
        let monthly_cv = group_variation(&monthly);
        let weekly_cv = group_variation(&weekly);

        let snapshot = MetricsSnapshot {
            total_revenue: values.iter().sum(),
            average_daily_sales,
            max_daily_sales: extreme(values, f64::max),
            min_daily_sales: extreme(values, f64::min),
            sales_std_dev,
            total_days,
            date_range_days: match (series.first_date(), series.last_date()) {
                (Some(first), Some(last)) => (last - first).num_days(),
                _ => 0,
            },
            volatility,
            momentum: self.momentum(values),
            trend_strength,
            growth_rate_7d: self.growth_rate(values, 7),
            growth_rate_30d: self.growth_rate(values, 30),
            consistency_score: consistency,
            prediction_confidence: prediction_confidence(
                total_days,
                volatility,
                trend_strength,
                consistency,
            ),
            seasonal_strength: monthly_cv.max(weekly_cv),
            seasonal_impact: monthly_cv * 100.0,
            peak_periods: PeakPeriods {
                months: top_keys(&monthly, PEAK_MONTHS),
                weekdays: top_keys(&weekly, PEAK_WEEKDAYS)
                    .into_iter()
                    .filter_map(|idx| Weekday::try_from(idx as u8).ok())
                    .collect(),
            },
            weekend_weekday_ratio: weekend_weekday_ratio(series),
        };

        info!(
            days = snapshot.total_days,
            volatility = format!("{:.4}", snapshot.volatility),
            trend_strength = format!("{:.3}", snapshot.trend_strength),
            consistency = format!("{:.3}", snapshot.consistency_score),
            confidence = format!("{:.3}", snapshot.prediction_confidence),
            "Computed sales metrics"
        );

        snapshot
    }

    /// Standard deviation over mean, carrying the sign of the mean; 0 when
    /// the mean is 0.
    pub fn volatility(&self, values: &[f64]) -> f64 {
        let m = mean(values);
        if m == 0.0 {
            return 0.0;
        }
        std_dev(values) / m
    }

    /// Percent change from the 7-day average ending a week ago to the
    /// latest 7-day average. Both windows must be complete, so fewer than
    /// 14 points yield 0.
    pub fn momentum(&self, values: &[f64]) -> f64 {
        let n = values.len();
        if n < 2 * MOMENTUM_WINDOW {
            return 0.0;
        }
        let recent = mean(&values[n - MOMENTUM_WINDOW..]);
        let prior = mean(&values[n - 2 * MOMENTUM_WINDOW..n - MOMENTUM_WINDOW]);
        percent_change(recent, prior)
    }

    /// `min(1, 1.5·|r|)` of value against time index.
    pub fn trend_strength(&self, values: &[f64]) -> f64 {
        let x: Vec<f64> = (0..values.len()).map(|i| i as f64).collect();
        match linregress(&x, values) {
            Some(fit) => {
                debug!(
                    slope = format!("{:.4}", fit.slope),
                    r = format!("{:.4}", fit.r),
                    p_value = format!("{:.4}", fit.p_value),
                    "Trend regression"
                );
                (fit.r.abs() * 1.5).min(1.0)
            }
            None => DEFAULT_TREND_STRENGTH,
        }
    }

    /// Percent change between the mean of the last `window` points and
    /// the `window` points before them.
    pub fn growth_rate(&self, values: &[f64], window: usize) -> f64 {
        let n = values.len();
        if window == 0 || n < 2 * window {
            return 0.0;
        }
        let recent = mean(&values[n - window..]);
        let previous = mean(&values[n - 2 * window..n - window]);
        percent_change(recent, previous)
    }
}

impl Default for MetricsEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn percent_change(current: f64, previous: f64) -> f64 {
    if previous == 0.0 {
        return 0.0;
    }
    let change = (current - previous) / previous * 100.0;
    if change.is_finite() {
        change
    } else {
        0.0
    }
}

fn extreme(values: &[f64], pick: fn(f64, f64) -> f64) -> f64 {
    values.iter().copied().reduce(pick).unwrap_or(0.0)
}

fn prediction_confidence(
    total_days: usize,
    volatility: f64,
    trend_strength: f64,
    consistency: f64,
) -> f64 {
    let volume = (total_days as f64 / FULL_CONFIDENCE_DAYS).min(1.0);
    let stability = (1.0 - 2.0 * volatility).max(0.0);
    let score = 0.3 * volume + 0.3 * stability + 0.2 * trend_strength + 0.2 * consistency;
    score.clamp(0.0, MAX_PREDICTION_CONFIDENCE)
}

/// Mean value per calendar key, ordered by key.
fn grouped_means<K: Ord>(
    series: &Series,
    key: impl Fn(NaiveDate) -> K,
) -> BTreeMap<K, f64> {
    let mut sums: BTreeMap<K, (f64, usize)> = BTreeMap::new();
    for (date, value) in series.iter() {
        let entry = sums.entry(key(date)).or_insert((0.0, 0));
        entry.0 += value;
        entry.1 += 1;
    }
    sums.into_iter()
        .map(|(k, (sum, count))| (k, sum / count as f64))
        .collect()
}

/// Coefficient of variation across group means; 0 with fewer than two
/// groups or a zero mean.
fn group_variation<K>(groups: &BTreeMap<K, f64>) -> f64 {
    let means: Vec<f64> = groups.values().copied().collect();
    let m = mean(&means);
    if means.len() < 2 || m == 0.0 {
        return 0.0;
    }
    std_dev(&means) / m.abs()
}

/// Keys of the `count` largest group means, largest first. Ties keep key order.
fn top_keys<K: Copy>(groups: &BTreeMap<K, f64>, count: usize) -> Vec<K> {
    let mut ranked: Vec<(K, f64)> = groups.iter().map(|(k, v)| (*k, *v)).collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    ranked.into_iter().take(count).map(|(k, _)| k).collect()
}

fn weekend_weekday_ratio(series: &Series) -> Option<f64> {
    let (weekend, weekday): (Vec<(NaiveDate, f64)>, Vec<_>) = series
        .iter()
        .partition(|(date, _)| matches!(date.weekday(), Weekday::Sat | Weekday::Sun));
    let weekend: Vec<f64> = weekend.into_iter().map(|(_, v)| v).collect();
    let weekday: Vec<f64> = weekday.into_iter().map(|(_, v)| v).collect();
    if weekend.is_empty() || weekday.is_empty() {
        return None;
    }
    let weekday_mean = mean(&weekday);
    if weekday_mean == 0.0 {
        return None;
    }
    Some(mean(&weekend) / weekday_mean)
}
