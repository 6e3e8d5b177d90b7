//! Context extraction.
//!
//! Reduces an [`AnalysisResult`] to the short phrases the planner weaves into
//! action text, plus a few hints (environment, framing, lighting). Structured
//! fields reported by the provider win over matches in the free-text
//! description. Matching is on whole words against the tables in
//! [`crate::terms`].

use std::collections::BTreeSet;

use shotplan_models::{AnalysisResult, Environment, ExtractedContext, Framing, LightingMood};
use tracing::debug;

use crate::terms::{
    ACCESSORIES, AGE_TERMS, COLORS, ENVIRONMENT_MARKERS, FRAMING_TERMS, GARMENTS,
    HELD_ITEM_STOPWORDS, LIGHTING_TERMS, OBJECTS, PLURAL_GARMENTS, SETTINGS, SUBJECT_NOUNS,
    TIME_OF_DAY,
};

/// Extraction settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextConfig {
    /// Cap on `detected_objects`
    pub max_objects: usize,
    /// Accessories mentioned in the subject phrase
    pub max_accessories: usize,
    pub scene_placeholder: String,
    pub subject_placeholder: String,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            max_objects: 8,
            max_accessories: 1,
            scene_placeholder: "surrounding scene".to_string(),
            subject_placeholder: "subject".to_string(),
        }
    }
}

/// Lowercased words of a text, split on anything but letters, digits,
/// hyphens and apostrophes.
struct Words(Vec<String>);

impl Words {
    fn new(text: &str) -> Self {
        let words = text
            .to_lowercase()
            .split(|c: char| !(c.is_alphanumeric() || c == '-' || c == '\''))
            .map(|w| w.trim_matches(|c| c == '-' || c == '\''))
            .map(|w| w.strip_suffix("'s").unwrap_or(w))
            .filter(|w| !w.is_empty())
            .map(str::to_string)
            .collect();
        Self(words)
    }

    fn find(&self, phrase: &str) -> Option<usize> {
        let needle: Vec<&str> = phrase.split_whitespace().collect();
        if needle.is_empty() || needle.len() > self.0.len() {
            return None;
        }
        self.0
            .windows(needle.len())
            .position(|window| window.iter().zip(&needle).all(|(a, b)| a == b))
    }

    fn contains(&self, phrase: &str) -> bool {
        self.find(phrase).is_some()
    }

    /// First table entry present in the text.
    fn first_of<T: Copy>(&self, table: &[(&str, T)]) -> Option<T> {
        table
            .iter()
            .find(|(term, _)| self.contains(term))
            .map(|(_, value)| *value)
    }

    fn get(&self, index: usize) -> Option<&str> {
        self.0.get(index).map(String::as_str)
    }
}

/// Extract context from an analysis result. Deterministic.
pub fn extract(analysis: &AnalysisResult, config: &ContextConfig) -> ExtractedContext {
    let words = Words::new(&analysis.basic_description);

    let setting = cleaned(&analysis.scene_details.setting).map(|s| {
        let implied = Words::new(&s).first_of(SETTINGS);
        (s, implied)
    });
    let setting = setting.or_else(|| {
        SETTINGS
            .iter()
            .find(|(term, _)| words.contains(term))
            .map(|(term, env)| (term.to_string(), Some(*env)))
    });

    let environment = structured_environment(analysis)
        .or_else(|| words.first_of(ENVIRONMENT_MARKERS))
        .or_else(|| setting.as_ref().and_then(|(_, env)| *env))
        .unwrap_or_default();

    let time_of_day = cleaned(&analysis.scene_details.time_of_day)
        .map(|t| {
            Words::new(&t)
                .first_of(TIME_OF_DAY)
                .map(str::to_string)
                .unwrap_or_else(|| format!("at {}", t))
        })
        .or_else(|| words.first_of(TIME_OF_DAY).map(str::to_string));

    let scene_phrase = scene_phrase(
        environment,
        setting.map(|(s, _)| s),
        time_of_day,
        &config.scene_placeholder,
    );

    let subject = &analysis.subject_analysis;
    let noun = cleaned(&subject.gender)
        .map(|g| {
            Words::new(&g)
                .first_of(SUBJECT_NOUNS)
                .map(str::to_string)
                .unwrap_or(g)
        })
        .or_else(|| words.first_of(SUBJECT_NOUNS).map(str::to_string));
    let age = cleaned(&subject.age)
        .map(|a| {
            Words::new(&a)
                .first_of(AGE_TERMS)
                .map(str::to_string)
                .unwrap_or(a)
        })
        .or_else(|| words.first_of(AGE_TERMS).map(str::to_string));
    let clothing = cleaned(&subject.clothing).or_else(|| clothing_from(&words));

    let mut accessories: Vec<String> = subject
        .accessories
        .iter()
        .filter_map(|a| cleaned_str(a))
        .collect();
    if accessories.is_empty() {
        accessories = ACCESSORIES
            .iter()
            .filter(|a| words.contains(a))
            .map(|a| a.to_string())
            .collect();
    }
    accessories.truncate(config.max_accessories);

    let mut held: Vec<String> = subject
        .held_items
        .iter()
        .filter_map(|h| cleaned_str(h))
        .collect();
    if held.is_empty() {
        held.extend(held_item_from(&words));
    }

    let subject_phrase = subject_phrase(
        age.as_deref(),
        noun.as_deref(),
        clothing.as_deref(),
        &accessories,
        held.first().map(String::as_str),
        &config.subject_placeholder,
    );

    let mut detected_objects = BTreeSet::new();
    for (term, canonical) in OBJECTS {
        if detected_objects.len() >= config.max_objects {
            break;
        }
        let is_subject = noun.as_deref() == Some(*canonical);
        let inside_held = held.iter().any(|h| Words::new(h).contains(term));
        if words.contains(term) && !is_subject && !inside_held {
            detected_objects.insert(canonical.to_string());
        }
    }
    for item in &held {
        if detected_objects.len() >= config.max_objects {
            break;
        }
        detected_objects.insert(item.clone());
    }

    let lighting_mood = structured_lighting(analysis)
        .or_else(|| words.first_of(LIGHTING_TERMS))
        .unwrap_or_default();
    let framing = structured_framing(analysis).or_else(|| words.first_of(FRAMING_TERMS));

    let context = ExtractedContext {
        scene_phrase,
        subject_phrase,
        detected_objects,
        environment,
        framing,
        lighting_mood,
    };
    debug!(
        scene = %context.scene_phrase,
        subject = %context.subject_phrase,
        objects = context.detected_objects.len(),
        "Extracted context"
    );
    context
}

fn cleaned(value: &Option<String>) -> Option<String> {
    value.as_deref().and_then(cleaned_str)
}

fn cleaned_str(value: &str) -> Option<String> {
    let value = value.trim().to_lowercase();
    (!value.is_empty()).then_some(value)
}

fn structured_environment(analysis: &AnalysisResult) -> Option<Environment> {
    let env = cleaned(&analysis.scene_details.environment)?;
    Words::new(&env).first_of(ENVIRONMENT_MARKERS)
}

fn structured_lighting(analysis: &AnalysisResult) -> Option<LightingMood> {
    let brightness = cleaned(&analysis.lighting_analysis.brightness)?;
    match brightness.as_str() {
        "high" => Some(LightingMood::Bright),
        "low" => Some(LightingMood::Dim),
        "medium" | "moderate" | "normal" | "natural" => Some(LightingMood::Neutral),
        other => Words::new(other).first_of(LIGHTING_TERMS),
    }
}

fn structured_framing(analysis: &AnalysisResult) -> Option<Framing> {
    let framing = cleaned(&analysis.composition_analysis.framing)?.replace(['_', '-'], " ");
    if framing.starts_with("close") || framing.starts_with("extreme close") {
        Some(Framing::CloseUp)
    } else if framing.starts_with("medium") {
        Some(Framing::Medium)
    } else if framing.starts_with("wide") || framing.starts_with("long") {
        Some(Framing::Wide)
    } else {
        None
    }
}

fn scene_phrase(
    environment: Environment,
    setting: Option<String>,
    time_of_day: Option<String>,
    placeholder: &str,
) -> String {
    let env_word = match environment {
        Environment::Outdoor => Some("outdoor"),
        Environment::Indoor => Some("indoor"),
        Environment::Unknown => None,
    };

    let base = match (env_word, setting) {
        (Some(env), Some(setting)) if !setting.starts_with(env) => format!("{} {}", env, setting),
        (_, Some(setting)) => setting,
        (Some("outdoor"), None) => "outdoor setting".to_string(),
        (Some(_), None) => "indoor space".to_string(),
        (None, None) => placeholder.to_string(),
    };

    match time_of_day {
        Some(time) => format!("{} {}", base, time),
        None => base,
    }
}

/// "red dress", "blue denim jacket", or a bare garment.
fn clothing_from(words: &Words) -> Option<String> {
    for (i, word) in words.0.iter().enumerate() {
        if !COLORS.contains(&word.as_str()) {
            continue;
        }
        match (words.get(i + 1), words.get(i + 2)) {
            (Some(next), _) if GARMENTS.contains(&next) => {
                return Some(format!("{} {}", word, next));
            }
            (Some(next), Some(garment)) if GARMENTS.contains(&garment) => {
                return Some(format!("{} {} {}", word, next, garment));
            }
            _ => {}
        }
    }
    words
        .0
        .iter()
        .find(|w| GARMENTS.contains(&w.as_str()))
        .cloned()
}

/// The object after "holding (a|an|the)", at most two words.
fn held_item_from(words: &Words) -> Option<String> {
    let start = words.find("holding")? + 1;
    let skip = matches!(words.get(start), Some("a" | "an" | "the" | "some" | "her" | "his"));
    let start = if skip { start + 1 } else { start };

    let item: Vec<&str> = words.0[start.min(words.0.len())..]
        .iter()
        .map(String::as_str)
        .take_while(|w| !HELD_ITEM_STOPWORDS.contains(w))
        .take(2)
        .collect();
    (!item.is_empty()).then(|| item.join(" "))
}

fn subject_phrase(
    age: Option<&str>,
    noun: Option<&str>,
    clothing: Option<&str>,
    accessories: &[String],
    held: Option<&str>,
    placeholder: &str,
) -> String {
    let noun = noun.unwrap_or(placeholder);
    let mut phrase = match age {
        Some(age) if !noun.starts_with(age) => format!("{} {}", age, noun),
        _ => noun.to_string(),
    };

    if let Some(clothing) = clothing {
        phrase.push_str(" in ");
        phrase.push_str(&with_article(clothing, garment_takes_article(clothing)));
    }
    if !accessories.is_empty() {
        let items: Vec<String> = accessories
            .iter()
            .map(|a| with_article(a, !a.ends_with('s')))
            .collect();
        phrase.push_str(" with ");
        phrase.push_str(&items.join(" and "));
    }
    if let Some(item) = held {
        phrase.push_str(" holding ");
        phrase.push_str(&with_article(item, !item.ends_with('s')));
    }
    phrase
}

fn garment_takes_article(clothing: &str) -> bool {
    clothing
        .split_whitespace()
        .last()
        .map(|last| GARMENTS.contains(&last) && !PLURAL_GARMENTS.contains(&last))
        .unwrap_or(false)
}

/// Prefix "a" or "an" when `article` is set.
pub(crate) fn with_article(noun: &str, article: bool) -> String {
    if !article {
        return noun.to_string();
    }
    format!("{} {}", indefinite_article(noun), noun)
}

pub(crate) fn indefinite_article(noun: &str) -> &'static str {
    match noun.chars().next() {
        Some('a' | 'e' | 'i' | 'o' | 'u') => "an",
        _ => "a",
    }
}
