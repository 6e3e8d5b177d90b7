//! Shot pools and action verbs used by the planner.

use shotplan_models::{CameraEffect, CameraMovement, ShotType};

/// Shot types for free segments, with draw weights.
pub const SHOT_POOL: &[(ShotType, u32)] = &[
    (ShotType::MediumShot, 5),
    (ShotType::MediumCloseUp, 4),
    (ShotType::CloseUp, 4),
    (ShotType::WideShot, 3),
    (ShotType::MediumWideShot, 3),
    (ShotType::EyeLevel, 3),
    (ShotType::LowAngle, 2),
    (ShotType::HighAngle, 2),
    (ShotType::OverTheShoulder, 2),
    (ShotType::ExtremeCloseUp, 1),
    (ShotType::AerialShot, 1),
    (ShotType::BirdsEyeView, 1),
    (ShotType::WormsEyeView, 1),
];

/// Camera movements for free segments. Static and the closing zoom out are reserved.
pub const MOVEMENT_POOL: &[(CameraMovement, u32)] = &[
    (CameraMovement::DollyIn, 4),
    (CameraMovement::DollyOut, 3),
    (CameraMovement::PanLeft, 3),
    (CameraMovement::PanRight, 3),
    (CameraMovement::TrackingShot, 3),
    (CameraMovement::TiltUp, 2),
    (CameraMovement::TiltDown, 2),
    (CameraMovement::ZoomIn, 2),
    (CameraMovement::ZoomOut, 2),
    (CameraMovement::OrbitAround, 2),
    (CameraMovement::SlightZoomIn, 2),
    (CameraMovement::CraneUp, 1),
    (CameraMovement::CraneDown, 1),
];

pub const EFFECT_POOL: &[CameraEffect] = &[
    CameraEffect::ShallowDepthOfField,
    CameraEffect::DeepFocus,
    CameraEffect::MotionBlur,
    CameraEffect::FocusPull,
    CameraEffect::SpeedRamping,
    CameraEffect::RackFocus,
    CameraEffect::BokehEffect,
    CameraEffect::LensFlare,
    CameraEffect::Vignette,
];

/// Framings for the custom action segment.
pub const ACTION_SHOTS: &[ShotType] = &[
    ShotType::MediumShot,
    ShotType::MediumCloseUp,
    ShotType::CloseUp,
];

pub const ACTION_EFFECTS: &[CameraEffect] = &[
    CameraEffect::MotionBlur,
    CameraEffect::FocusPull,
    CameraEffect::ShallowDepthOfField,
    CameraEffect::SpeedRamping,
];

/// Fixed closing shot.
pub const CLOSING_PAIR: (ShotType, CameraMovement) =
    (ShotType::WideShot, CameraMovement::SlowZoomOut);

/// Ways of placing the subject in the scene.
pub const SCENE_CLAUSES: &[&str] = &["in the", "against the", "within the", "framed by the"];

/// Opening phrasings, `the {subject} {phrase} {scene}`. The first one that
/// does not repeat a custom action is used.
pub const OPENING_PHRASES: &[&str] = &[
    "is revealed in the",
    "comes into view within the",
    "appears against the",
    "is introduced amid the",
];

/// Closing phrasings, `the {subject} {lead} {scene} {tail}`.
pub const CLOSING_PHRASES: &[(&str, &str)] = &[
    ("settles into a final pose as the", "fills the frame"),
    ("holds still while the", "opens up around them"),
    ("comes to rest as the", "widens into view"),
    ("lingers for a last moment amid the", "stretching out behind"),
];

/// Endings for a closing segment that carries the custom action itself.
pub const CLOSING_ACTION_TAILS: &[&str] = &[
    "before settling into a final pose",
    "and then holds still",
    "before coming to rest",
    "as the shot draws to an end",
];

/// Kind of subject action; consecutive segments never share one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VerbCategory {
    Gaze,
    Posture,
    Movement,
    Expression,
    Gesture,
}

impl VerbCategory {
    pub const ALL: &'static [VerbCategory] = &[
        VerbCategory::Gaze,
        VerbCategory::Posture,
        VerbCategory::Movement,
        VerbCategory::Expression,
        VerbCategory::Gesture,
    ];

    pub fn verbs(&self) -> &'static [&'static str] {
        match self {
            VerbCategory::Gaze => &[
                "looks around thoughtfully",
                "looks directly at the camera",
                "turns to follow something off-frame",
                "gazes into the distance",
            ],
            VerbCategory::Posture => &[
                "adjusts posture naturally",
                "shifts weight slightly",
                "straightens up with quiet confidence",
                "leans in slightly",
            ],
            VerbCategory::Movement => &[
                "takes a small step forward",
                "walks slowly through the frame",
                "turns gently in place",
                "steps to the side",
            ],
            VerbCategory::Expression => &[
                "smiles warmly",
                "breaks into a soft laugh",
                "nods gently",
                "closes both eyes for a moment",
            ],
            VerbCategory::Gesture => &[
                "gestures expressively",
                "raises a hand in greeting",
                "reaches toward the camera",
                "points at something in the distance",
            ],
        }
    }
}

/// Camera movement suggested by the words of a custom action.
pub fn movement_hint(action: &str) -> CameraMovement {
    let action = action.to_lowercase();
    let mentions = |stems: &[&str]| stems.iter().any(|s| action.contains(s));

    if mentions(&["wave", "gesture", "point"]) {
        CameraMovement::SlightZoomIn
    } else if mentions(&["walk", "move", "dance"]) {
        CameraMovement::TrackingShot
    } else if mentions(&["jump", "leap"]) {
        CameraMovement::TiltUp
    } else {
        CameraMovement::DollyIn
    }
}
