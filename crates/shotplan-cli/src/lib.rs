//! Image-to-video prompt pipeline.
//!
//! Wires the provider chain, context extraction, planning and rendering
//! into a single [`Generator`], configured from the environment.

pub mod config;
pub mod error;
pub mod logging;
pub mod pipeline;

pub use config::PipelineConfig;
pub use error::{PipelineError, PipelineResult};
pub use logging::RequestLogger;
pub use pipeline::{BatchEntry, BatchError, GenerationOutput, Generator};
