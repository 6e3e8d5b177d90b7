//! Prompt rendering.
//!
//! Two text forms of the same timeline: a compact timestamp list for
//! models that take `[Ns: ...]` markers, and a flowing narrative paragraph.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use shotplan_models::{OutputFormat, Segment, ShotType, Timeline};

use crate::extractor::indefinite_article;

/// Transitions between middle segments, used in rotation.
const CONNECTIVES: &[&str] = &[
    "Then",
    "Next",
    "Moments later",
    "Without a cut",
    "As the moment unfolds",
];

const CLOSING_CONNECTIVE: &str = "Finally";

/// Rendering settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderConfig {
    /// Separator between timestamp entries
    pub delimiter: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            delimiter: "; ".to_string(),
        }
    }
}

/// Rendered prompt text. A field is absent when its format was not requested.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct RenderedPrompts {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub narrative: Option<String>,
}

/// Render a timeline in the requested format(s).
pub fn render(timeline: &Timeline, format: OutputFormat, config: &RenderConfig) -> RenderedPrompts {
    RenderedPrompts {
        timestamp: format
            .includes_timestamp()
            .then(|| render_timestamp(timeline, config)),
        narrative: format
            .includes_narrative()
            .then(|| render_narrative(timeline)),
    }
}

/// `[0s: wide shot, static, ...]; [3s: ...]`
pub fn render_timestamp(timeline: &Timeline, config: &RenderConfig) -> String {
    timeline
        .segments
        .iter()
        .map(|s| {
            format!(
                "[{}s: {}, {}, {}]",
                s.start_secs, s.shot_type, s.camera_movement, s.action_text
            )
        })
        .collect::<Vec<_>>()
        .join(&config.delimiter)
}

/// One paragraph: an opening clause, rotating connectives, a closing clause.
pub fn render_narrative(timeline: &Timeline) -> String {
    let last = timeline.segments.len().saturating_sub(1);
    timeline
        .segments
        .iter()
        .enumerate()
        .map(|(index, segment)| {
            if index == 0 {
                format!(
                    "Opening on {}, the camera {} as {}{}.",
                    shot_with_article(segment.shot_type),
                    segment.camera_movement.as_verb(),
                    segment.action_text,
                    effect_clause(segment)
                )
            } else {
                let connective = if index == last {
                    CLOSING_CONNECTIVE
                } else {
                    CONNECTIVES[(index - 1) % CONNECTIVES.len()]
                };
                format!(
                    "{}, the camera {} on {} as {}{}.",
                    connective,
                    segment.camera_movement.as_verb(),
                    shot_with_article(segment.shot_type),
                    segment.action_text,
                    effect_clause(segment)
                )
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn shot_with_article(shot: ShotType) -> String {
    let name = shot.as_str();
    format!("{} {}", indefinite_article(name), name)
}

fn effect_clause(segment: &Segment) -> String {
    segment
        .effect
        .map(|effect| format!(", with {}", effect))
        .unwrap_or_default()
}
