//! Parsing vision-LLM replies into a [`RawAnalysis`].

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{ProviderError, ProviderResult};
use crate::provider::RawAnalysis;

/// Instruction sent alongside the image to the vision chat providers.
pub const ANALYSIS_PROMPT: &str = r#"Describe this image for a video director.

Return ONLY a single JSON object with this schema:
{
  "description": "One or two sentences describing the subject, what they are doing and where",
  "scene": {"setting": "park", "environment": "indoor|outdoor", "time_of_day": "sunset"},
  "subject": {
    "clothing": "red dress",
    "accessories": ["sunglasses"],
    "held_items": ["coffee cup"],
    "pose": "standing",
    "age": "young",
    "gender": "woman"
  },
  "lighting": {"brightness": "bright|medium|dim", "color_temperature": "warm|neutral|cool"},
  "composition": {"framing": "close_up|medium_shot|wide_shot"},
  "colors": {"dominant_colors": ["red", "green"], "color_mood": "vibrant"}
}

Omit any field you cannot determine."#;

/// Parse a model reply.
///
/// JSON replies (optionally inside a markdown fence) fill the structured
/// sections that deserialize cleanly; anything else becomes the description.
pub fn parse_report(text: &str) -> ProviderResult<RawAnalysis> {
    let body = strip_code_fence(text);
    if body.is_empty() {
        return Err(ProviderError::invalid_response("empty reply"));
    }

    let value = match serde_json::from_str::<Value>(body) {
        Ok(value @ Value::Object(_)) => value,
        _ => return Ok(RawAnalysis::from_description(body)),
    };

    let description = ["description", "basic_description", "caption"]
        .iter()
        .find_map(|key| value.get(*key).and_then(Value::as_str))
        .map(str::trim)
        .unwrap_or_default();
    if description.is_empty() {
        return Err(ProviderError::invalid_response(
            "JSON reply carries no description",
        ));
    }

    Ok(RawAnalysis {
        description: description.to_string(),
        scene: section(&value, "scene"),
        subject: section(&value, "subject"),
        lighting: section(&value, "lighting"),
        composition: section(&value, "composition"),
        colors: section(&value, "colors"),
        technical: None,
    })
}

fn section<T: DeserializeOwned>(value: &Value, key: &str) -> Option<T> {
    value
        .get(key)
        .filter(|v| v.is_object())
        .and_then(|v| serde_json::from_value(v.clone()).ok())
}

/// Remove a surrounding ```json fence if present.
pub fn strip_code_fence(text: &str) -> &str {
    let text = text.trim();
    let text = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix("```"))
        .unwrap_or(text);
    text.strip_suffix("```").unwrap_or(text).trim()
}
