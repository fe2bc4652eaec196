mod boosted;
mod fallback;
mod naive;
mod points;
#[cfg(feature = "seasonal")]
mod seasonal;

pub use boosted::{FeatureRegressor, FittedRegressor, GradientBoostedTechnique, FEATURE_NAMES};
pub use fallback::ConstantFallbackTechnique;
pub use naive::NaiveTechnique;
#[cfg(feature = "seasonal")]
pub use seasonal::SeasonalTrendTechnique;
