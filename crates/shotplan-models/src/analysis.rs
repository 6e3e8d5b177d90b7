//! Image analysis results.
//!
//! An [`AnalysisResult`] is produced once per request by the fallback chain and
//! handed to the context extractor. Every structured field is optional: a
//! provider that cannot report something leaves it out.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::provider::{ErrorClass, ProviderKind};

/// Scene setting and environment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SceneDetails {
    /// Named setting (park, kitchen, beach, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub setting: Option<String>,
    /// "indoor" or "outdoor"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,
    /// Time of day (sunset, night, morning, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_of_day: Option<String>,
}

/// Attributes of the main subject.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SubjectAnalysis {
    /// Clothing summary, e.g. "red dress"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clothing: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub accessories: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub held_items: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pose: Option<String>,
    /// Age cue (young, elderly, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<String>,
    /// Gender cue or subject noun (woman, man, child, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
}

/// Lighting conditions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct LightingAnalysis {
    /// bright / medium / dim
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brightness: Option<String>,
    /// warm / neutral / cool
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_temperature: Option<String>,
}

/// Composition and framing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CompositionAnalysis {
    /// close_up / medium_shot / wide_shot
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub framing: Option<String>,
}

/// Color palette.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ColorAnalysis {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dominant_colors: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_mood: Option<String>,
}

/// Header-level facts about the image.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TechnicalDetails {
    pub width: u32,
    pub height: u32,
    /// Width divided by height, rounded to two decimals
    pub aspect_ratio: f64,
    /// Container format name (png, jpeg, ...)
    pub format: String,
}

impl TechnicalDetails {
    /// Build technical details from image dimensions.
    pub fn new(width: u32, height: u32, format: impl Into<String>) -> Self {
        let aspect_ratio = if height == 0 {
            0.0
        } else {
            ((width as f64 / height as f64) * 100.0).round() / 100.0
        };
        Self {
            width,
            height,
            aspect_ratio,
            format: format.into(),
        }
    }

    pub fn is_portrait(&self) -> bool {
        self.height > self.width
    }

    pub fn is_landscape(&self) -> bool {
        self.width > self.height
    }
}

/// A provider that failed before the one that produced the result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FailedAttempt {
    pub provider: ProviderKind,
    pub error_class: ErrorClass,
    /// Number of calls made to this provider
    pub attempts: u32,
    pub message: String,
}

/// Complete analysis of a single image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AnalysisResult {
    /// Free-text description of the image
    pub basic_description: String,
    #[serde(default)]
    pub scene_details: SceneDetails,
    #[serde(default)]
    pub subject_analysis: SubjectAnalysis,
    #[serde(default)]
    pub lighting_analysis: LightingAnalysis,
    #[serde(default)]
    pub composition_analysis: CompositionAnalysis,
    #[serde(default)]
    pub color_analysis: ColorAnalysis,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub technical_details: Option<TechnicalDetails>,
    /// Identifier of the provider (and model) that produced the description
    pub provider_used: String,
    /// True when the guaranteed local provider had to answer
    #[serde(default)]
    pub degraded: bool,
    /// Providers that failed first, in the order they were tried
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failed_attempts: Vec<FailedAttempt>,
}

impl AnalysisResult {
    /// Create a result carrying only a description.
    pub fn from_description(
        description: impl Into<String>,
        provider_used: impl Into<String>,
    ) -> Self {
        Self {
            basic_description: description.into(),
            scene_details: SceneDetails::default(),
            subject_analysis: SubjectAnalysis::default(),
            lighting_analysis: LightingAnalysis::default(),
            composition_analysis: CompositionAnalysis::default(),
            color_analysis: ColorAnalysis::default(),
            technical_details: None,
            provider_used: provider_used.into(),
            degraded: false,
            failed_attempts: Vec::new(),
        }
    }

    pub fn with_scene(mut self, scene: SceneDetails) -> Self {
        self.scene_details = scene;
        self
    }

    pub fn with_subject(mut self, subject: SubjectAnalysis) -> Self {
        self.subject_analysis = subject;
        self
    }

    pub fn with_lighting(mut self, lighting: LightingAnalysis) -> Self {
        self.lighting_analysis = lighting;
        self
    }

    pub fn with_composition(mut self, composition: CompositionAnalysis) -> Self {
        self.composition_analysis = composition;
        self
    }

    /// Whether any provider failed before this result was produced.
    pub fn fell_back(&self) -> bool {
        !self.failed_attempts.is_empty() || self.degraded
    }
}
