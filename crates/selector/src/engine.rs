use std::sync::Arc;

use common::{ForecastConfig, ForecastResult, ForecastTechnique, Result, SalesError, Series};
use models::{
    ConstantFallbackTechnique, FeatureRegressor, GradientBoostedTechnique, NaiveTechnique,
};
use tracing::{debug, info, warn};

use crate::Capabilities;

/// Ordered chain of forecasting techniques with graceful degradation.
///
/// Techniques are tried by tier. An unsuitable technique is skipped; a
/// technique that errors or returns a malformed forecast is logged and the
/// next one is tried. Only when every technique fails does
/// [`ForecastEngine::forecast`] return [`SalesError::AllTechniquesFailed`].
pub struct ForecastEngine {
    techniques: Vec<Box<dyn ForecastTechnique>>,
}

impl ForecastEngine {
    /// Chain built from the process-wide [`Capabilities`].
    pub fn new(config: &ForecastConfig) -> Self {
        Self::with_capabilities(config, *Capabilities::global())
    }

    pub fn with_capabilities(config: &ForecastConfig, capabilities: Capabilities) -> Self {
        Self::build(config, capabilities, None)
    }

    /// Chain including the gradient-boosted tier driven by `regressor`.
    pub fn with_regressor(
        config: &ForecastConfig,
        capabilities: Capabilities,
        regressor: Arc<dyn FeatureRegressor>,
    ) -> Self {
        let capabilities = Capabilities {
            gradient_boosted: true,
            ..capabilities
        };
        Self::build(config, capabilities, Some(regressor))
    }

    /// Chain of caller-supplied techniques, ordered by tier.
    pub fn with_techniques(mut techniques: Vec<Box<dyn ForecastTechnique>>) -> Self {
        techniques.sort_by_key(|t| t.tier());
        Self { techniques }
    }

    fn build(
        config: &ForecastConfig,
        capabilities: Capabilities,
        regressor: Option<Arc<dyn FeatureRegressor>>,
    ) -> Self {
        let mut techniques: Vec<Box<dyn ForecastTechnique>> = Vec::new();

        #[cfg(feature = "seasonal")]
        if capabilities.seasonal && config.seasonal_enabled {
            techniques.push(Box::new(models::SeasonalTrendTechnique::from_config(config)));
        }
        if capabilities.gradient_boosted && regressor.is_some() {
            techniques.push(Box::new(GradientBoostedTechnique::from_config(config, regressor)));
        }
        techniques.push(Box::new(NaiveTechnique::new()));
        techniques.push(Box::new(ConstantFallbackTechnique::from_config(config)));

        debug!(
            chain = ?techniques.iter().map(|t| t.name()).collect::<Vec<_>>(),
            "Forecast chain assembled"
        );
        Self::with_techniques(techniques)
    }

    /// Names of the techniques in the order they are tried.
    pub fn technique_names(&self) -> Vec<&str> {
        self.techniques.iter().map(|t| t.name()).collect()
    }

    pub fn forecast(&self, series: &Series, horizon: usize) -> Result<ForecastResult> {
        if series.is_empty() {
            return Err(SalesError::InsufficientData(
                "cannot forecast an empty series".into(),
            ));
        }
        if horizon == 0 {
            return Err(SalesError::InvalidInput("horizon must be at least 1".into()));
        }

        let mut failures = Vec::new();
        for technique in &self.techniques {
            let name = technique.name();
            if !technique.is_suitable(series) {
                debug!(technique = name, points = series.len(), "Technique unsuitable, skipping");
                continue;
            }

            match technique
                .predict(series, horizon)
                .and_then(|result| check_output(series, horizon, result))
            {
                Ok(result) => {
                    info!(
                        technique = name,
                        tier = technique.tier().rank(),
                        horizon = horizon,
                        fallback = result.generated_with_fallback,
                        "Forecast generated"
                    );
                    return Ok(result);
                }
                Err(e) => {
                    warn!(technique = name, error = %e, "Technique failed, trying next");
                    failures.push(format!("{name}: {e}"));
                }
            }
        }

        Err(SalesError::AllTechniquesFailed(failures.join("; ")))
    }
}

/// Reject outputs that break the forecast contract.
fn check_output(
    series: &Series,
    horizon: usize,
    result: ForecastResult,
) -> Result<ForecastResult> {
    if result.points.len() != horizon {
        return Err(SalesError::ModelError(format!(
            "expected {horizon} points, got {}",
            result.points.len()
        )));
    }
    let expected_dates = series.future_dates(horizon)?;
    for (point, expected) in result.points.iter().zip(&expected_dates) {
        if point.date != *expected {
            return Err(SalesError::ModelError(format!(
                "point dated {} where {} was expected",
                point.date, expected
            )));
        }
        let finite = [point.predicted_value, point.lower_bound, point.upper_bound]
            .iter()
            .all(|v| v.is_finite());
        if !finite {
            return Err(SalesError::ModelError(format!(
                "non-finite prediction on {}",
                point.date
            )));
        }
        if !(0.0..=1.0).contains(&point.confidence) {
            return Err(SalesError::ModelError(format!(
                "confidence {} on {} outside [0, 1]",
                point.confidence, point.date
            )));
        }
    }
    Ok(result)
}
