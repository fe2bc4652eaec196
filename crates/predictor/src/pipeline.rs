use analyzer::MetricsEngine;
use common::{
    AppConfig, ColumnMap, ForecastResult, MetricsSnapshot, NormalizationSummary, PipelineConfig,
    RawTable, Result, Series, ValidationVerdict,
};
use detector::ColumnDetector;
use normalize::SeriesNormalizer;
use selector::ForecastEngine;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use validator::ValidationGate;

/// Everything one pass over an uploaded table produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineReport {
    pub column_map: ColumnMap,
    pub verdict: ValidationVerdict,
    /// `None` when the table could not be turned into a series.
    pub normalization: Option<NormalizationSummary>,
    pub metrics: MetricsSnapshot,
    /// `None` when the verdict is invalid.
    pub forecast: Option<ForecastResult>,
}

/// Intermediate state shared by `analyze` and `run`.
struct Prepared {
    column_map: ColumnMap,
    verdict: ValidationVerdict,
    normalized: Result<(Series, NormalizationSummary)>,
    metrics: MetricsSnapshot,
}

/// detector → gate → normalizer → {metrics, forecast}.
///
/// Holds no per-request state; one instance can serve any number of tables,
/// including concurrently.
pub struct Pipeline {
    detector: ColumnDetector,
    gate: ValidationGate,
    normalizer: SeriesNormalizer,
    metrics: MetricsEngine,
    engine: ForecastEngine,
    default_horizon: usize,
}

impl Pipeline {
    pub fn new(config: &PipelineConfig) -> Self {
        Self::with_engine(config, ForecastEngine::new(&config.forecast))
    }

    pub fn from_app_config(config: &AppConfig) -> Self {
        Self::new(&config.pipeline)
    }

    /// Pipeline forecasting through a caller-assembled engine.
    pub fn with_engine(config: &PipelineConfig, engine: ForecastEngine) -> Self {
        Self {
            detector: ColumnDetector::new(&config.detection),
            gate: ValidationGate::new(&config.validation),
            normalizer: SeriesNormalizer::new(
                &config.normalization,
                config.detection.synthetic_epoch,
            ),
            metrics: MetricsEngine::new(),
            engine,
            default_horizon: config.forecast.default_horizon,
        }
    }

    pub fn default_horizon(&self) -> usize {
        self.default_horizon
    }

    /// Column roles, validation verdict and metrics of a raw table.
    ///
    /// Never fails. Structural problems are reported in the verdict, and
    /// metrics fall back to those of an empty series when no row survives
    /// normalization.
    pub fn analyze(&self, table: &RawTable) -> (ColumnMap, ValidationVerdict, MetricsSnapshot) {
        let prepared = self.prepare(table);
        (prepared.column_map, prepared.verdict, prepared.metrics)
    }

    /// Forecast `horizon` days past the end of a normalized series.
    pub fn forecast(
        &self,
        series: &Series,
        horizon: usize,
        column_map: &ColumnMap,
    ) -> Result<ForecastResult> {
        let mut result = self.engine.forecast(series, horizon)?;
        result.target_column = column_map.sales_column.clone();
        Ok(result)
    }

    /// Full pass over a table. The forecast is skipped when validation fails.
    pub fn run(&self, table: &RawTable, horizon: usize) -> Result<PipelineReport> {
        let Prepared {
            column_map,
            verdict,
            normalized,
            metrics,
        } = self.prepare(table);

        let (forecast, normalization) = if verdict.is_valid {
            // A valid verdict with no surviving row still propagates the error.
            let (series, summary) = normalized?;
            (Some(self.forecast(&series, horizon, &column_map)?), Some(summary))
        } else {
            info!(issues = verdict.issues.len(), "Validation failed, skipping forecast");
            (None, normalized.ok().map(|(_, summary)| summary))
        };

        Ok(PipelineReport {
            column_map,
            verdict,
            normalization,
            metrics,
            forecast,
        })
    }

    fn prepare(&self, table: &RawTable) -> Prepared {
        info!(
            columns = table.columns.len(),
            rows = table.row_count(),
            "Starting sales pipeline"
        );

        let column_map = self.detector.detect(table);
        let verdict = self.gate.validate(table, &column_map);

        let normalized = self.normalizer.normalize(table, &column_map);
        let metrics = match &normalized {
            Ok((series, _)) => self.metrics.compute(series),
            Err(e) => {
                warn!(error = %e, "Normalization failed, metrics use an empty series");
                self.metrics.compute(&Series::empty())
            }
        };

        info!(
            valid = verdict.is_valid,
            quality = format!("{:.3}", verdict.data_quality_score),
            days = metrics.total_days,
            "Analysis complete"
        );

        Prepared {
            column_map,
            verdict,
            normalized,
            metrics,
        }
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(&PipelineConfig::default())
    }
}

/// [`Pipeline::analyze`] with the default configuration.
pub fn analyze(table: &RawTable) -> (ColumnMap, ValidationVerdict, MetricsSnapshot) {
    Pipeline::default().analyze(table)
}

/// [`Pipeline::forecast`] with the default configuration.
pub fn forecast(series: &Series, horizon: usize, column_map: &ColumnMap) -> Result<ForecastResult> {
    Pipeline::default().forecast(series, horizon, column_map)
}

/// [`Pipeline::run`] with the default configuration.
pub fn run(table: &RawTable, horizon: usize) -> Result<PipelineReport> {
    Pipeline::default().run(table, horizon)
}

#[cfg(test)]
mod tests;
