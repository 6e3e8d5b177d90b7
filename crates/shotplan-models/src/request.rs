//! Generation requests.

use std::fmt;
use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;
use validator::Validate;

/// Unique identifier for a generation request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct RequestId(pub String);

impl RequestId {
    /// Generate a new random request ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which rendered prompt(s) to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    /// `[0s: shot, movement, action]` markers
    Timestamp,
    /// Flowing paragraph
    Narrative,
    #[default]
    Both,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Timestamp => "timestamp",
            OutputFormat::Narrative => "narrative",
            OutputFormat::Both => "both",
        }
    }

    pub fn includes_timestamp(&self) -> bool {
        matches!(self, OutputFormat::Timestamp | OutputFormat::Both)
    }

    pub fn includes_narrative(&self) -> bool {
        matches!(self, OutputFormat::Narrative | OutputFormat::Both)
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = FormatParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "timestamp" | "timestamps" => Ok(OutputFormat::Timestamp),
            "narrative" | "hunyuan" => Ok(OutputFormat::Narrative),
            "both" => Ok(OutputFormat::Both),
            _ => Err(FormatParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Error)]
#[error("Unknown output format: {0}")]
pub struct FormatParseError(String);

/// Options for a single image-to-prompt generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Validate)]
pub struct GenerationRequest {
    /// Requested video length in whole seconds
    pub duration_secs: u32,
    /// Short action to embed verbatim, e.g. "waves hello"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 200))]
    pub custom_action: Option<String>,
    /// Seed for reproducible planning
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    #[serde(default)]
    pub format: OutputFormat,
}

impl GenerationRequest {
    pub fn new(duration_secs: u32) -> Self {
        Self {
            duration_secs,
            custom_action: None,
            seed: None,
            format: OutputFormat::Both,
        }
    }

    /// Attach a custom action. Blank input is ignored.
    pub fn with_custom_action(mut self, action: impl Into<String>) -> Self {
        let action = action.into();
        let trimmed = action.trim();
        self.custom_action = if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        };
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }
}
