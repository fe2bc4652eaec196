mod pipeline;

pub use pipeline::{analyze, forecast, run, Pipeline, PipelineReport};
