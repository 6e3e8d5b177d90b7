//! Pipeline error types.

use shotplan_planner::PlanError;
use shotplan_vision::{ImageError, ProviderError};
use thiserror::Error;

pub type PipelineResult<T> = Result<T, PipelineError>;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Invalid request: {0}")]
    InvalidRequest(#[from] validator::ValidationErrors),

    #[error("Invalid image: {0}")]
    Image(#[from] ImageError),

    #[error("Invalid plan parameters: {0}")]
    Plan(#[from] PlanError),

    #[error("Provider setup failed: {0}")]
    Provider(#[from] ProviderError),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl PipelineError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Whether the caller supplied something unusable, as opposed to a setup problem.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidRequest(_) | Self::Image(_) | Self::Plan(_)
        )
    }
}
