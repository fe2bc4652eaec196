use chrono::{Days, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::{Result, SalesError};

/// Which column plays which role in an uploaded table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMap {
    /// `None` only when detection failed; the validation gate reports it.
    pub sales_column: Option<String>,
    /// Always populated; names a synthesized daily axis when
    /// `date_synthesized` is set.
    pub date_column: String,
    #[serde(default)]
    pub date_synthesized: bool,
    pub product_column: Option<String>,
    pub region_column: Option<String>,
    pub customer_column: Option<String>,
    #[serde(default)]
    pub additional_columns: Vec<String>,
}

/// Daily `(date, value)` series. Dates and values are parallel vectors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    dates: Vec<NaiveDate>,
    values: Vec<f64>,
}

impl Series {
    pub fn new(dates: Vec<NaiveDate>, values: Vec<f64>) -> Result<Self> {
        if dates.len() != values.len() {
            return Err(SalesError::InvalidInput(
                "dates and values must have the same length".into(),
            ));
        }
        Ok(Self { dates, values })
    }

    /// Consecutive daily series starting at `start`.
    pub fn daily(start: NaiveDate, values: Vec<f64>) -> Result<Self> {
        let dates = (0..values.len())
            .map(|i| add_days(start, i as u64))
            .collect::<Result<Vec<_>>>()?;
        Self::new(dates, values)
    }

    pub fn empty() -> Self {
        Self {
            dates: Vec::new(),
            values: Vec::new(),
        }
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.dates.first().copied()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.dates.last().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, f64)> + '_ {
        self.dates.iter().copied().zip(self.values.iter().copied())
    }

    /// `horizon` consecutive days starting the day after the last date.
    pub fn future_dates(&self, horizon: usize) -> Result<Vec<NaiveDate>> {
        let last = self
            .last_date()
            .ok_or_else(|| SalesError::InsufficientData("series is empty".into()))?;
        (1..=horizon as u64).map(|i| add_days(last, i)).collect()
    }

    /// Checks the normalized-series invariants: non-empty, one entry per
    /// calendar day with no gaps or duplicates, finite values.
    pub fn check_normalized(&self) -> Result<()> {
        if self.is_empty() {
            return Err(SalesError::InsufficientData("series is empty".into()));
        }
        for w in self.dates.windows(2) {
            if w[0].succ_opt() != Some(w[1]) {
                return Err(SalesError::InvalidInput(format!(
                    "dates not consecutive: {} followed by {}",
                    w[0], w[1]
                )));
            }
        }
        if let Some(v) = self.values.iter().find(|v| !v.is_finite()) {
            return Err(SalesError::InvalidInput(format!("non-finite value {v}")));
        }
        Ok(())
    }
}

pub fn add_days(date: NaiveDate, days: u64) -> Result<NaiveDate> {
    date.checked_add_days(Days::new(days))
        .ok_or_else(|| SalesError::InvalidInput(format!("date overflow: {date} + {days} days")))
}

/// What the normalizer did to get from the raw table to the series.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizationSummary {
    pub input_rows: usize,
    /// Rows dropped because the value or date could not be coerced.
    pub dropped_rows: usize,
    pub capped_outliers: usize,
    /// Rows folded into another row sharing the same date.
    pub merged_duplicates: usize,
    /// Calendar days inserted to close gaps.
    pub filled_days: usize,
    pub date_synthesized: bool,
}

/// Peak calendar months (1–12) and weekdays, highest mean first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PeakPeriods {
    pub months: Vec<u32>,
    pub weekdays: Vec<Weekday>,
}

/// Business indicators derived from one normalized series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub total_revenue: f64,
    pub average_daily_sales: f64,
    pub max_daily_sales: f64,
    pub min_daily_sales: f64,
    pub sales_std_dev: f64,
    pub total_days: usize,
    pub date_range_days: i64,
    pub volatility: f64,
    pub momentum: f64,
    pub trend_strength: f64,
    pub growth_rate_7d: f64,
    pub growth_rate_30d: f64,
    pub consistency_score: f64,
    pub prediction_confidence: f64,
    pub seasonal_strength: f64,
    pub seasonal_impact: f64,
    pub peak_periods: PeakPeriods,
    pub weekend_weekday_ratio: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendLabel {
    Upward,
    Downward,
}

impl TrendLabel {
    pub fn relative_to(value: f64, historical_mean: f64) -> Self {
        if value > historical_mean {
            TrendLabel::Upward
        } else {
            TrendLabel::Downward
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionPoint {
    pub date: NaiveDate,
    pub predicted_value: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
    pub confidence: f64,
    pub trend_label: TrendLabel,
}

/// Fit quality of a forecast.
///
/// `mape` and `rmse` are only measured by techniques that produce in-sample
/// fitted values. The naive and constant techniques leave them `None` and
/// report an illustrative `model_confidence` constant instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccuracyMetrics {
    pub mape: Option<f64>,
    pub rmse: Option<f64>,
    pub model_confidence: f64,
    pub samples_evaluated: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastResult {
    pub model_name: String,
    pub points: Vec<PredictionPoint>,
    pub accuracy_metrics: AccuracyMetrics,
    /// Sales column the forecast was produced for, when known.
    #[serde(default)]
    pub target_column: Option<String>,
    /// Set when the last-resort constant technique produced the points.
    #[serde(default)]
    pub generated_with_fallback: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationVerdict {
    pub is_valid: bool,
    pub issues: Vec<String>,
    pub warnings: Vec<String>,
    pub data_quality_score: f64,
    pub analysis_confidence: f64,
}

/// Position of a technique in the fallback chain; lower ranks are tried first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TechniqueTier {
    SeasonalTrend,
    GradientBoosted,
    Naive,
    ConstantFallback,
}

impl TechniqueTier {
    pub fn rank(self) -> u8 {
        match self {
            TechniqueTier::SeasonalTrend => 1,
            TechniqueTier::GradientBoosted => 2,
            TechniqueTier::Naive => 3,
            TechniqueTier::ConstantFallback => 4,
        }
    }
}

/// Contract every forecasting technique in the chain implements.
pub trait ForecastTechnique: Send + Sync {
    fn name(&self) -> &str;

    fn tier(&self) -> TechniqueTier;

    /// Whether the technique's preconditions hold for this series.
    fn is_suitable(&self, series: &Series) -> bool;

    /// Produce exactly `horizon` points starting the day after the last date.
    fn predict(&self, series: &Series, horizon: usize) -> Result<ForecastResult>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[test]
    fn test_series_length_mismatch() {
        assert!(Series::new(vec![day(1)], vec![1.0, 2.0]).is_err());
    }

    #[test]
    fn test_future_dates_start_after_last() {
        let series = Series::daily(day(1), vec![1.0, 2.0, 3.0]).unwrap();
        let future = series.future_dates(3).unwrap();
        assert_eq!(future, vec![day(4), day(5), day(6)]);
        assert!(Series::empty().future_dates(3).is_err());
    }

    #[test]
    fn test_check_normalized() {
        assert!(Series::daily(day(1), vec![1.0, 2.0]).unwrap().check_normalized().is_ok());
        let gap = Series::new(vec![day(1), day(3)], vec![1.0, 2.0]).unwrap();
        assert!(gap.check_normalized().is_err());
        let dup = Series::new(vec![day(1), day(1)], vec![1.0, 2.0]).unwrap();
        assert!(dup.check_normalized().is_err());
        let nan = Series::daily(day(1), vec![1.0, f64::NAN]).unwrap();
        assert!(nan.check_normalized().is_err());
        assert!(Series::empty().check_normalized().is_err());
    }

    #[test]
    fn test_trend_label() {
        assert_eq!(TrendLabel::relative_to(11.0, 10.0), TrendLabel::Upward);
        assert_eq!(TrendLabel::relative_to(10.0, 10.0), TrendLabel::Downward);
    }

    #[test]
    fn test_tier_ordering() {
        assert!(TechniqueTier::SeasonalTrend < TechniqueTier::GradientBoosted);
        assert!(TechniqueTier::Naive < TechniqueTier::ConstantFallback);
        assert_eq!(TechniqueTier::ConstantFallback.rank(), 4);
    }

    #[test]
    fn test_dates_serialize_as_iso_days() {
        let point = PredictionPoint {
            date: day(5),
            predicted_value: 1.0,
            lower_bound: 0.8,
            upper_bound: 1.2,
            confidence: 0.7,
            trend_label: TrendLabel::Upward,
        };
        let json = serde_json::to_value(&point).unwrap();
        assert_eq!(json["date"], "2024-01-05");
        assert_eq!(json["trend_label"], "upward");
    }
}
