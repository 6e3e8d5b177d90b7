//! Planning errors.

use thiserror::Error;

pub type PlanResult<T> = Result<T, PlanError>;

/// Input validation failures. Values are never clamped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanError {
    #[error("Duration {duration}s is outside the allowed range {min}-{max}s")]
    DurationOutOfRange { duration: u32, min: u32, max: u32 },

    #[error("Custom action is {len} characters, limit is {max}")]
    CustomActionTooLong { len: usize, max: usize },

    #[error("Invalid planner config: {0}")]
    InvalidConfig(String),
}

impl PlanError {
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}
