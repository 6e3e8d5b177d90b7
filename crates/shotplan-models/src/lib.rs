//! Shared data models for the shotplan pipeline.
//!
//! This crate provides Serde-serializable types for:
//! - Image analysis results and provider configuration
//! - Extracted scene/subject context
//! - Planned timelines of camera shots
//! - Generation requests and output formats

pub mod analysis;
pub mod context;
pub mod provider;
pub mod request;
pub mod timeline;

// Re-export common types
pub use analysis::{
    AnalysisResult, ColorAnalysis, CompositionAnalysis, FailedAttempt, LightingAnalysis,
    SceneDetails, SubjectAnalysis, TechnicalDetails,
};
pub use context::{Environment, ExtractedContext, Framing, LightingMood};
pub use provider::{
    ErrorClass, ProviderKind, ProviderParseError, ProviderSpec, RetryPolicy, TransportConfig,
};
pub use request::{FormatParseError, GenerationRequest, OutputFormat, RequestId};
pub use timeline::{
    CameraEffect, CameraMovement, Segment, ShotType, Timeline, VocabularyParseError,
};
