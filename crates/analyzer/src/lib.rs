mod analyzer;
mod regression;

pub use analyzer::MetricsEngine;
pub use regression::{linregress, LinearFit};
