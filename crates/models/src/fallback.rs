use common::stats::mean;
use common::{
    AccuracyMetrics, ForecastConfig, ForecastResult, ForecastTechnique, Result, SalesError,
    Series, TechniqueTier,
};
use tracing::{debug, warn};

use crate::points::{assemble_points, linear_decay};

const JITTER_LOW: f64 = -0.10;
const JITTER_HIGH: f64 = 0.15;
const LOWER_RATIO: f64 = 0.7;
const UPPER_RATIO: f64 = 1.3;
const START_CONFIDENCE: f64 = 0.6;
const CONFIDENCE_DECAY: f64 = 0.003;

/// 64-bit linear congruential generator.
struct Lcg {
    state: u64,
}

impl Lcg {
    fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    /// Uniform in [0, 1).
    fn next_unit(&mut self) -> f64 {
        self.state = self
            .state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1);
        (self.state >> 11) as f64 / (1u64 << 53) as f64
    }
}

/// Last-resort forecast: a flat baseline with bounded, seeded jitter.
///
/// Output is reproducible for a given seed and series and is always marked
/// with `generated_with_fallback`.
pub struct ConstantFallbackTechnique {
    seed: u64,
    default_baseline: f64,
}

impl ConstantFallbackTechnique {
    pub fn new(seed: u64, default_baseline: f64) -> Self {
        Self {
            seed,
            default_baseline,
        }
    }

    pub fn from_config(config: &ForecastConfig) -> Self {
        Self::new(config.fallback_seed, config.fallback_baseline)
    }

    /// Mean of the finite values, or the configured default.
    fn baseline(&self, series: &Series) -> f64 {
        let finite: Vec<f64> = series
            .values()
            .iter()
            .copied()
            .filter(|v| v.is_finite())
            .collect();
        let m = mean(&finite);
        if finite.is_empty() || !m.is_finite() {
            warn!(
                default = self.default_baseline,
                "No finite history, using default fallback baseline"
            );
            self.default_baseline
        } else {
            m
        }
    }
}

impl Default for ConstantFallbackTechnique {
    fn default() -> Self {
        Self::from_config(&ForecastConfig::default())
    }
}

impl ForecastTechnique for ConstantFallbackTechnique {
    fn name(&self) -> &str {
        "constant_fallback"
    }

    fn tier(&self) -> TechniqueTier {
        TechniqueTier::ConstantFallback
    }

    fn is_suitable(&self, series: &Series) -> bool {
        !series.is_empty()
    }

    fn predict(&self, series: &Series, horizon: usize) -> Result<ForecastResult> {
        if series.is_empty() {
            return Err(SalesError::InsufficientData(
                "constant fallback needs a last date to forecast from".into(),
            ));
        }
        let baseline = self.baseline(series);
        debug!(
            baseline = format!("{:.2}", baseline),
            seed = self.seed,
            horizon = horizon,
            "Constant fallback forecasting"
        );

        let mut rng = Lcg::new(self.seed);
        let predicted: Vec<f64> = (0..horizon)
            .map(|_| {
                let jitter = JITTER_LOW + (JITTER_HIGH - JITTER_LOW) * rng.next_unit();
                baseline * (1.0 + jitter)
            })
            .collect();
        let lower: Vec<f64> = predicted.iter().map(|p| p * LOWER_RATIO).collect();
        let upper: Vec<f64> = predicted.iter().map(|p| p * UPPER_RATIO).collect();

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
                samples_evaluated: 0,
            },
            target_column: None,
            generated_with_fallback: true,
        })
    }
}
