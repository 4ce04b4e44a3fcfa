pub mod orchestrator;

pub use orchestrator::{Pipeline, PipelineOptions};
