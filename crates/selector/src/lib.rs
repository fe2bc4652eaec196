mod capabilities;
mod engine;

pub use capabilities::Capabilities;
pub use engine::ForecastEngine;
