//! Planned shot timelines.

use std::fmt;
use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
#[error("Unknown {kind}: {value}")]
pub struct VocabularyParseError {
    kind: &'static str,
    value: String,
}

// Accepts both the display form ("medium close-up") and the serde form ("medium_close_up").
fn parse_named<T: Copy + serde::de::DeserializeOwned>(
    all: &[T],
    name: fn(&T) -> &'static str,
    kind: &'static str,
    s: &str,
) -> Result<T, VocabularyParseError> {
    let normalize = |v: &str| {
        v.trim()
            .to_lowercase()
            .replace(['_', '-'], " ")
            .replace('\'', "")
    };
    let wanted = normalize(s);
    if let Ok(item) = serde_json::from_value(serde_json::Value::String(wanted.replace(' ', "_"))) {
        return Ok(item);
    }
    all.iter()
        .copied()
        .find(|item| normalize(name(item)) == wanted)
        .ok_or_else(|| VocabularyParseError {
            kind,
            value: s.to_string(),
        })
}

/// Camera framing / angle of a shot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ShotType {
    WideShot,
    MediumWideShot,
    MediumShot,
    MediumCloseUp,
    CloseUp,
    ExtremeCloseUp,
    AerialShot,
    LowAngle,
    HighAngle,
    EyeLevel,
    BirdsEyeView,
    WormsEyeView,
    OverTheShoulder,
}

impl ShotType {
    pub const ALL: &'static [ShotType] = &[
        ShotType::WideShot,
        ShotType::MediumWideShot,
        ShotType::MediumShot,
        ShotType::MediumCloseUp,
        ShotType::CloseUp,
        ShotType::ExtremeCloseUp,
        ShotType::AerialShot,
        ShotType::LowAngle,
        ShotType::HighAngle,
        ShotType::EyeLevel,
        ShotType::BirdsEyeView,
        ShotType::WormsEyeView,
        ShotType::OverTheShoulder,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ShotType::WideShot => "wide shot",
            ShotType::MediumWideShot => "medium wide shot",
            ShotType::MediumShot => "medium shot",
            ShotType::MediumCloseUp => "medium close-up",
            ShotType::CloseUp => "close-up",
            ShotType::ExtremeCloseUp => "extreme close-up",
            ShotType::AerialShot => "aerial shot",
            ShotType::LowAngle => "low angle shot",
            ShotType::HighAngle => "high angle shot",
            ShotType::EyeLevel => "eye level shot",
            ShotType::BirdsEyeView => "bird's eye view",
            ShotType::WormsEyeView => "worm's eye view",
            ShotType::OverTheShoulder => "over-the-shoulder shot",
        }
    }
}

impl fmt::Display for ShotType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ShotType {
    type Err = VocabularyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_named(Self::ALL, Self::as_str, "shot type", s)
    }
}

/// Camera motion during a shot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum CameraMovement {
    Static,
    DollyIn,
    DollyOut,
    PanLeft,
    PanRight,
    TiltUp,
    TiltDown,
    ZoomIn,
    ZoomOut,
    SlightZoomIn,
    SlowZoomOut,
    TrackingShot,
    CraneUp,
    CraneDown,
    OrbitAround,
}

impl CameraMovement {
    pub const ALL: &'static [CameraMovement] = &[
        CameraMovement::Static,
        CameraMovement::DollyIn,
        CameraMovement::DollyOut,
        CameraMovement::PanLeft,
        CameraMovement::PanRight,
        CameraMovement::TiltUp,
        CameraMovement::TiltDown,
        CameraMovement::ZoomIn,
        CameraMovement::ZoomOut,
        CameraMovement::SlightZoomIn,
        CameraMovement::SlowZoomOut,
        CameraMovement::TrackingShot,
        CameraMovement::CraneUp,
        CameraMovement::CraneDown,
        CameraMovement::OrbitAround,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CameraMovement::Static => "static",
            CameraMovement::DollyIn => "dolly in",
            CameraMovement::DollyOut => "dolly out",
            CameraMovement::PanLeft => "pan left",
            CameraMovement::PanRight => "pan right",
            CameraMovement::TiltUp => "tilt up",
            CameraMovement::TiltDown => "tilt down",
            CameraMovement::ZoomIn => "zoom in",
            CameraMovement::ZoomOut => "zoom out",
            CameraMovement::SlightZoomIn => "slight zoom in",
            CameraMovement::SlowZoomOut => "slow zoom out",
            CameraMovement::TrackingShot => "tracking shot",
            CameraMovement::CraneUp => "crane up",
            CameraMovement::CraneDown => "crane down",
            CameraMovement::OrbitAround => "orbit around",
        }
    }

    /// Present-tense verb phrase, e.g. "dollies in".
    pub fn as_verb(&self) -> &'static str {
        match self {
            CameraMovement::Static => "holds steady",
            CameraMovement::DollyIn => "dollies in",
            CameraMovement::DollyOut => "dollies out",
            CameraMovement::PanLeft => "pans left",
            CameraMovement::PanRight => "pans right",
            CameraMovement::TiltUp => "tilts up",
            CameraMovement::TiltDown => "tilts down",
            CameraMovement::ZoomIn => "zooms in",
            CameraMovement::ZoomOut => "zooms out",
            CameraMovement::SlightZoomIn => "eases into a slight zoom",
            CameraMovement::SlowZoomOut => "slowly zooms out",
            CameraMovement::TrackingShot => "tracks alongside",
            CameraMovement::CraneUp => "cranes up",
            CameraMovement::CraneDown => "cranes down",
            CameraMovement::OrbitAround => "orbits around",
        }
    }
}

impl fmt::Display for CameraMovement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for CameraMovement {
    type Err = VocabularyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_named(Self::ALL, Self::as_str, "camera movement", s)
    }
}

/// Optional lens / post effect on a shot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum CameraEffect {
    ShallowDepthOfField,
    NaturalDepthOfField,
    DeepFocus,
    MotionBlur,
    FocusPull,
    SpeedRamping,
    RackFocus,
    BokehEffect,
    LensFlare,
    Vignette,
    CinematicLighting,
}

impl CameraEffect {
    pub const ALL: &'static [CameraEffect] = &[
        CameraEffect::ShallowDepthOfField,
        CameraEffect::NaturalDepthOfField,
        CameraEffect::DeepFocus,
        CameraEffect::MotionBlur,
        CameraEffect::FocusPull,
        CameraEffect::SpeedRamping,
        CameraEffect::RackFocus,
        CameraEffect::BokehEffect,
        CameraEffect::LensFlare,
        CameraEffect::Vignette,
        CameraEffect::CinematicLighting,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CameraEffect::ShallowDepthOfField => "shallow depth of field",
            CameraEffect::NaturalDepthOfField => "natural depth of field",
            CameraEffect::DeepFocus => "deep focus",
            CameraEffect::MotionBlur => "motion blur",
            CameraEffect::FocusPull => "focus pull",
            CameraEffect::SpeedRamping => "speed ramping",
            CameraEffect::RackFocus => "rack focus",
            CameraEffect::BokehEffect => "bokeh effect",
            CameraEffect::LensFlare => "lens flare",
            CameraEffect::Vignette => "vignette",
            CameraEffect::CinematicLighting => "cinematic lighting",
        }
    }
}

impl fmt::Display for CameraEffect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for CameraEffect {
    type Err = VocabularyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_named(Self::ALL, Self::as_str, "camera effect", s)
    }
}

/// One time-bounded entry of a timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Segment {
    /// Inclusive start, in seconds
    pub start_secs: u32,
    /// Exclusive end, in seconds
    pub end_secs: u32,
    pub shot_type: ShotType,
    pub camera_movement: CameraMovement,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effect: Option<CameraEffect>,
    /// What the subject does during the shot
    pub action_text: String,
}

impl Segment {
    pub fn length_secs(&self) -> u32 {
        self.end_secs.saturating_sub(self.start_secs)
    }

    /// The pair that must not repeat between neighbours.
    pub fn shot_pair(&self) -> (ShotType, CameraMovement) {
        (self.shot_type, self.camera_movement)
    }
}

/// Ordered, contiguous sequence of segments covering `[0, duration)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Timeline {
    pub duration_secs: u32,
    /// Seed the planner drew with; replaying it reproduces the timeline
    pub seed: u64,
    pub segments: Vec<Segment>,
}

impl Timeline {
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Segments start at zero, touch end-to-start, have positive length and
    /// end exactly at the duration.
    pub fn is_contiguous(&self) -> bool {
        let mut cursor = 0;
        for segment in &self.segments {
            if segment.start_secs != cursor || segment.end_secs <= segment.start_secs {
                return false;
            }
            cursor = segment.end_secs;
        }
        !self.segments.is_empty() && cursor == self.duration_secs
    }

    /// Whether two neighbours share the same shot type and camera movement.
    pub fn has_adjacent_repeat(&self) -> bool {
        self.segments
            .windows(2)
            .any(|pair| pair[0].shot_pair() == pair[1].shot_pair())
    }
}
