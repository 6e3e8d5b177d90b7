//! Sequence planning.
//!
//! A timeline always opens on a static establishing shot and closes on a
//! wide slow zoom out. Segments in between are drawn from weighted pools
//! with a memory of the previous draw, so no two adjacent segments share a
//! `(shot_type, camera_movement)` pair and no two adjacent actions share a
//! verb category. All randomness comes from one seeded [`StdRng`].

use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use shotplan_models::{
    CameraEffect, CameraMovement, ExtractedContext, Framing, LightingMood, Segment, ShotType,
    Timeline,
};
use tracing::{debug, info};

use crate::error::{PlanError, PlanResult};
use crate::vocabulary::{
    movement_hint, VerbCategory, ACTION_EFFECTS, ACTION_SHOTS, CLOSING_ACTION_TAILS,
    CLOSING_PAIR, CLOSING_PHRASES, EFFECT_POOL, MOVEMENT_POOL, OPENING_PHRASES, SCENE_CLAUSES,
    SHOT_POOL,
};

type ShotPair = (ShotType, CameraMovement);

/// Planner limits.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannerConfig {
    pub min_duration_secs: u32,
    pub max_duration_secs: u32,
    pub min_segment_secs: u32,
    pub max_segment_secs: u32,
    /// Longest accepted custom action, in characters
    pub max_custom_action_chars: usize,
    /// Redraws before the deterministic fallback picks a pair
    pub max_redraws: u32,
    /// Probability that a free segment carries an effect
    pub effect_chance: f64,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            min_duration_secs: 5,
            max_duration_secs: 120,
            min_segment_secs: 2,
            max_segment_secs: 4,
            max_custom_action_chars: 200,
            max_redraws: 16,
            effect_chance: 0.5,
        }
    }
}

impl PlannerConfig {
    /// Check that every allowed duration can be split into valid segments.
    pub fn validate(&self) -> PlanResult<()> {
        if self.min_segment_secs < 1 {
            return Err(PlanError::invalid_config("min_segment_secs must be at least 1"));
        }
        if self.max_segment_secs < 2 * self.min_segment_secs {
            return Err(PlanError::invalid_config(format!(
                "max_segment_secs ({}) must be at least twice min_segment_secs ({})",
                self.max_segment_secs, self.min_segment_secs
            )));
        }
        if self.min_duration_secs < 2 * self.min_segment_secs {
            return Err(PlanError::invalid_config(format!(
                "min_duration_secs ({}) must fit two segments of {}s",
                self.min_duration_secs, self.min_segment_secs
            )));
        }
        if self.min_duration_secs > self.max_duration_secs {
            return Err(PlanError::invalid_config(format!(
                "min_duration_secs ({}) exceeds max_duration_secs ({})",
                self.min_duration_secs, self.max_duration_secs
            )));
        }
        if !(0.0..=1.0).contains(&self.effect_chance) {
            return Err(PlanError::invalid_config("effect_chance must be within 0..=1"));
        }
        Ok(())
    }

    pub fn check_duration(&self, duration_secs: u32) -> PlanResult<()> {
        if duration_secs < self.min_duration_secs || duration_secs > self.max_duration_secs {
            return Err(PlanError::DurationOutOfRange {
                duration: duration_secs,
                min: self.min_duration_secs,
                max: self.max_duration_secs,
            });
        }
        Ok(())
    }

    pub fn check_custom_action(&self, action: &str) -> PlanResult<()> {
        let len = action.trim().chars().count();
        if len > self.max_custom_action_chars {
            return Err(PlanError::CustomActionTooLong {
                len,
                max: self.max_custom_action_chars,
            });
        }
        Ok(())
    }
}

/// Number of segments for a duration. Non-decreasing in `duration_secs`.
///
/// The target segment length shrinks linearly from `max_segment_secs` at the
/// shortest duration to `min_segment_secs` at the longest, so long videos get
/// proportionally more, shorter shots.
pub fn segment_count(duration_secs: u32, config: &PlannerConfig) -> u32 {
    let min_seg = config.min_segment_secs.max(1);
    let max_seg = config.max_segment_secs.max(min_seg);

    let span = config.max_duration_secs.saturating_sub(config.min_duration_secs) as f64;
    let progress = if span == 0.0 {
        0.0
    } else {
        (duration_secs.saturating_sub(config.min_duration_secs) as f64 / span).min(1.0)
    };
    let target = max_seg as f64 - (max_seg - min_seg) as f64 * progress;
    let count = (duration_secs as f64 / target).round() as u32;

    let lower = duration_secs.div_ceil(max_seg).max(2);
    let upper = duration_secs / min_seg;
    count.max(lower).min(upper)
}

fn spans(duration_secs: u32, count: u32) -> Vec<(u32, u32)> {
    let boundary = |i: u32| (duration_secs as u64 * i as u64 / count as u64) as u32;
    (0..count).map(|i| (boundary(i), boundary(i + 1))).collect()
}

/// What the previous segment drew.
#[derive(Debug, Default)]
struct DrawMemory {
    last_pair: Option<ShotPair>,
    last_category: Option<VerbCategory>,
}

struct Planner<'a> {
    rng: StdRng,
    config: &'a PlannerConfig,
    context: &'a ExtractedContext,
    /// Verbs that would duplicate the custom action
    excluded_verbs: Vec<&'static str>,
    /// Lowercased custom action; no other text may repeat it
    reserved: Option<String>,
    memory: DrawMemory,
}

/// Plan a timeline for `duration_secs`.
///
/// `custom_action` is trimmed; blank counts as absent. Without a `seed`, one
/// is drawn from entropy and recorded in the timeline.
pub fn plan(
    context: &ExtractedContext,
    duration_secs: u32,
    custom_action: Option<&str>,
    seed: Option<u64>,
    config: &PlannerConfig,
) -> PlanResult<Timeline> {
    config.validate()?;
    config.check_duration(duration_secs)?;

    let custom_action = custom_action.map(str::trim).filter(|a| !a.is_empty());
    if let Some(action) = custom_action {
        config.check_custom_action(action)?;
    }

    let seed = seed.unwrap_or_else(rand::random);
    let mut count = segment_count(duration_secs, config);
    // Room for opening, custom and closing when the duration allows it.
    if custom_action.is_some() && count < 3 && duration_secs / config.min_segment_secs >= 3 {
        count = 3;
    }

    let mut planner = Planner::new(seed, config, context, custom_action);
    let spans = spans(duration_secs, count);
    let last = spans.len() - 1;
    let mut segments = Vec::with_capacity(spans.len());

    for (index, (start_secs, end_secs)) in spans.into_iter().enumerate() {
        let segment = if index == 0 {
            planner.opening(start_secs, end_secs)
        } else if index == last {
            planner.closing(start_secs, end_secs, custom_action.filter(|_| last == 1))
        } else if index == 1 && custom_action.is_some() {
            let action = custom_action.unwrap_or_default();
            planner.custom(start_secs, end_secs, action, index + 1 == last)
        } else {
            planner.free(start_secs, end_secs, index + 1 == last)
        };
        planner.memory.last_pair = Some(segment.shot_pair());
        segments.push(segment);
    }

    info!(
        duration_secs,
        seed,
        segments = segments.len(),
        custom_action = custom_action.is_some(),
        "Planned timeline"
    );

    Ok(Timeline {
        duration_secs,
        seed,
        segments,
    })
}

impl<'a> Planner<'a> {
    fn new(
        seed: u64,
        config: &'a PlannerConfig,
        context: &'a ExtractedContext,
        custom_action: Option<&str>,
    ) -> Self {
        let excluded_verbs = match custom_action {
            Some(action) => {
                let action = action.to_lowercase();
                VerbCategory::ALL
                    .iter()
                    .flat_map(|c| c.verbs().iter().copied())
                    .filter(|verb| verb.contains(action.as_str()) || action.contains(verb))
                    .collect()
            }
            None => Vec::new(),
        };

        Self {
            rng: StdRng::seed_from_u64(seed),
            config,
            context,
            excluded_verbs,
            reserved: custom_action.map(str::to_lowercase),
            memory: DrawMemory::default(),
        }
    }

    fn repeats_action(&self, text: &str) -> bool {
        self.reserved
            .as_deref()
            .is_some_and(|action| text.to_lowercase().contains(action))
    }

    /// First candidate that does not repeat the custom action, else the last.
    fn first_clear(&self, candidates: Vec<String>) -> String {
        let last = candidates.len().saturating_sub(1);
        let index = candidates
            .iter()
            .position(|text| !self.repeats_action(text))
            .unwrap_or(last);
        candidates.into_iter().nth(index).unwrap_or_default()
    }

    fn opening(&mut self, start_secs: u32, end_secs: u32) -> Segment {
        let shot_type = match self.context.framing {
            Some(Framing::CloseUp) => ShotType::MediumShot,
            Some(Framing::Wide) => ShotType::WideShot,
            Some(Framing::Medium) | None => ShotType::MediumWideShot,
        };
        let effect = match self.context.lighting_mood {
            LightingMood::Bright => CameraEffect::ShallowDepthOfField,
            LightingMood::Dim => CameraEffect::CinematicLighting,
            LightingMood::Neutral => CameraEffect::NaturalDepthOfField,
        };

        Segment {
            start_secs,
            end_secs,
            shot_type,
            camera_movement: CameraMovement::Static,
            effect: Some(effect),
            action_text: self.first_clear(
                OPENING_PHRASES
                    .iter()
                    .map(|phrase| {
                        format!(
                            "the {} {} {}",
                            self.context.subject_phrase, phrase, self.context.scene_phrase
                        )
                    })
                    .collect(),
            ),
        }
    }

    fn closing(&mut self, start_secs: u32, end_secs: u32, custom_action: Option<&str>) -> Segment {
        let (shot_type, camera_movement) = CLOSING_PAIR;
        let action_text = match custom_action {
            Some(action) => {
                let tail = self.first_clear(
                    CLOSING_ACTION_TAILS.iter().map(|t| t.to_string()).collect(),
                );
                format!("the {} {} {}", self.context.subject_phrase, action, tail)
            }
            None => self.first_clear(
                CLOSING_PHRASES
                    .iter()
                    .map(|(lead, tail)| {
                        format!(
                            "the {} {} {} {}",
                            self.context.subject_phrase, lead, self.context.scene_phrase, tail
                        )
                    })
                    .collect(),
            ),
        };

        Segment {
            start_secs,
            end_secs,
            shot_type,
            camera_movement,
            effect: Some(CameraEffect::ShallowDepthOfField),
            action_text,
        }
    }

    fn custom(
        &mut self,
        start_secs: u32,
        end_secs: u32,
        action: &str,
        before_closing: bool,
    ) -> Segment {
        let shot_type = ACTION_SHOTS
            .choose(&mut self.rng)
            .copied()
            .unwrap_or(ShotType::MediumShot);
        let hinted = (shot_type, movement_hint(action));
        let (shot_type, camera_movement) = if self.forbidden(hinted, before_closing) {
            self.draw_pair(before_closing)
        } else {
            hinted
        };
        let effect = ACTION_EFFECTS.choose(&mut self.rng).copied();
        let clause = self.scene_clause();

        Segment {
            start_secs,
            end_secs,
            shot_type,
            camera_movement,
            effect,
            action_text: format!("the {} {} {}", self.context.subject_phrase, action, clause),
        }
    }

    fn free(&mut self, start_secs: u32, end_secs: u32, before_closing: bool) -> Segment {
        let (shot_type, camera_movement) = self.draw_pair(before_closing);
        let effect = if self.rng.random_bool(self.config.effect_chance) {
            EFFECT_POOL.choose(&mut self.rng).copied()
        } else {
            None
        };
        let mut action_text = String::new();
        for _ in 0..self.config.max_redraws.max(1) {
            let verb = self.draw_verb();
            let clause = self.scene_clause();
            action_text = format!("the {} {} {}", self.context.subject_phrase, verb, clause);
            if !self.repeats_action(&action_text) {
                break;
            }
        }

        Segment {
            start_secs,
            end_secs,
            shot_type,
            camera_movement,
            effect,
            action_text,
        }
    }

    fn forbidden(&self, pair: ShotPair, before_closing: bool) -> bool {
        self.memory.last_pair == Some(pair) || (before_closing && pair == CLOSING_PAIR)
    }

    fn draw_pair(&mut self, before_closing: bool) -> ShotPair {
        for attempt in 0..self.config.max_redraws {
            let pair = (pick(&mut self.rng, SHOT_POOL), pick(&mut self.rng, MOVEMENT_POOL));
            if !self.forbidden(pair, before_closing) {
                return pair;
            }
            debug!(attempt, shot = %pair.0, movement = %pair.1, "Rejected repeated shot pair");
        }

        // Deterministic fallback: first allowed pair in pool order.
        SHOT_POOL
            .iter()
            .flat_map(|(shot, _)| MOVEMENT_POOL.iter().map(move |(movement, _)| (*shot, *movement)))
            .find(|pair| !self.forbidden(*pair, before_closing))
            .unwrap_or((SHOT_POOL[0].0, MOVEMENT_POOL[0].0))
    }

    fn draw_verb(&mut self) -> &'static str {
        let excluded = &self.excluded_verbs;
        let available = |category: &VerbCategory| -> Vec<&'static str> {
            category
                .verbs()
                .iter()
                .copied()
                .filter(|verb| !excluded.contains(verb))
                .collect()
        };

        let categories: Vec<VerbCategory> = VerbCategory::ALL
            .iter()
            .copied()
            .filter(|c| Some(*c) != self.memory.last_category && !available(c).is_empty())
            .collect();
        let Some(category) = categories.choose(&mut self.rng).copied() else {
            return "holds the moment";
        };

        let verbs = available(&category);
        let verb = verbs.choose(&mut self.rng).copied().unwrap_or("holds the moment");
        self.memory.last_category = Some(category);
        verb
    }

    fn scene_clause(&mut self) -> String {
        let prefixes: Vec<&str> = SCENE_CLAUSES
            .iter()
            .copied()
            .filter(|prefix| !self.repeats_action(prefix))
            .collect();
        let prefix = prefixes.choose(&mut self.rng).copied().unwrap_or("in the");
        format!("{} {}", prefix, self.context.scene_phrase)
    }
}

fn pick<T: Copy>(rng: &mut StdRng, pool: &[(T, u32)]) -> T {
    pool.choose_weighted(rng, |item| item.1)
        .map(|item| item.0)
        .unwrap_or(pool[0].0)
}
