//! Context extracted from an analysis result.

use std::collections::BTreeSet;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Whether the scene is inside or outside.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum Environment {
    Indoor,
    Outdoor,
    #[default]
    Unknown,
}

/// How tightly the source image frames its subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Framing {
    CloseUp,
    Medium,
    Wide,
}

/// Overall lighting impression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum LightingMood {
    Bright,
    Dim,
    #[default]
    Neutral,
}

/// Compact scene/subject entities used by the sequence planner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ExtractedContext {
    /// Short phrase for the setting, e.g. "outdoor park at sunset"
    pub scene_phrase: String,
    /// Short phrase for the subject, e.g. "young woman in a red dress"
    pub subject_phrase: String,
    /// Recognised objects, sorted
    pub detected_objects: BTreeSet<String>,
    #[serde(default)]
    pub environment: Environment,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub framing: Option<Framing>,
    #[serde(default)]
    pub lighting_mood: LightingMood,
}

impl ExtractedContext {
    /// Context with the given phrases and no hints.
    pub fn new(scene_phrase: impl Into<String>, subject_phrase: impl Into<String>) -> Self {
        Self {
            scene_phrase: scene_phrase.into(),
            subject_phrase: subject_phrase.into(),
            detected_objects: BTreeSet::new(),
            environment: Environment::Unknown,
            framing: None,
            lighting_mood: LightingMood::Neutral,
        }
    }
}
