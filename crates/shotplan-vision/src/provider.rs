//! The analysis provider capability.

use async_trait::async_trait;
use shotplan_models::{
    AnalysisResult, ColorAnalysis, CompositionAnalysis, FailedAttempt, LightingAnalysis,
    ProviderKind, SceneDetails, SubjectAnalysis, TechnicalDetails,
};

use crate::error::ProviderResult;
use crate::image::ImagePayload;

/// Per-call information handed to a provider by the retry loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallContext {
    /// 1 for the first call, incremented on every retry
    pub attempt: u32,
    /// Ask the backend to block until its model is ready
    pub wait_for_model: bool,
}

impl CallContext {
    pub fn first() -> Self {
        Self {
            attempt: 1,
            wait_for_model: false,
        }
    }

    /// Context for call number `attempt`. Retries always request waiting.
    pub fn for_attempt(attempt: u32) -> Self {
        Self {
            attempt,
            wait_for_model: attempt > 1,
        }
    }
}

/// What a provider reports, before the chain tags it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawAnalysis {
    pub description: String,
    pub scene: Option<SceneDetails>,
    pub subject: Option<SubjectAnalysis>,
    pub lighting: Option<LightingAnalysis>,
    pub composition: Option<CompositionAnalysis>,
    pub colors: Option<ColorAnalysis>,
    pub technical: Option<TechnicalDetails>,
}

impl RawAnalysis {
    pub fn from_description(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            ..Default::default()
        }
    }

    /// Finish into an [`AnalysisResult`].
    ///
    /// Technical details fall back to what the image header says.
    pub fn into_result(
        self,
        provider_used: String,
        image: &ImagePayload,
        failed_attempts: Vec<FailedAttempt>,
        degraded: bool,
    ) -> AnalysisResult {
        AnalysisResult {
            basic_description: self.description,
            scene_details: self.scene.unwrap_or_default(),
            subject_analysis: self.subject.unwrap_or_default(),
            lighting_analysis: self.lighting.unwrap_or_default(),
            composition_analysis: self.composition.unwrap_or_default(),
            color_analysis: self.colors.unwrap_or_default(),
            technical_details: Some(self.technical.unwrap_or_else(|| image.technical_details())),
            provider_used,
            degraded,
            failed_attempts,
        }
    }
}

/// A backend able to describe an image.
///
/// Implementations perform a single call; retry, timeout and fall-through
/// belong to the chain.
#[async_trait]
pub trait AnalysisProvider: Send + Sync {
    fn kind(&self) -> ProviderKind;

    async fn analyze(&self, image: &ImagePayload, call: CallContext)
        -> ProviderResult<RawAnalysis>;
}
