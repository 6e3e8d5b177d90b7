//! Curated term tables for context extraction.
//!
//! Terms are lowercase and matched on word boundaries. Multi-word terms
//! match as consecutive words. Order matters: earlier entries win.

use shotplan_models::{Environment, Framing, LightingMood};

/// Words that mark the scene as outside or inside.
pub const ENVIRONMENT_MARKERS: &[(&str, Environment)] = &[
    ("outdoor", Environment::Outdoor),
    ("outdoors", Environment::Outdoor),
    ("outside", Environment::Outdoor),
    ("nature", Environment::Outdoor),
    ("open air", Environment::Outdoor),
    ("indoor", Environment::Indoor),
    ("indoors", Environment::Indoor),
    ("inside", Environment::Indoor),
    ("interior", Environment::Indoor),
];

/// Named settings and the environment they imply.
///
/// Rooms come first so "living room" beats "room".
pub const SETTINGS: &[(&str, Environment)] = &[
    // rooms
    ("living room", Environment::Indoor),
    ("dining room", Environment::Indoor),
    ("kitchen", Environment::Indoor),
    ("bedroom", Environment::Indoor),
    ("bathroom", Environment::Indoor),
    ("classroom", Environment::Indoor),
    ("office", Environment::Indoor),
    ("studio", Environment::Indoor),
    ("gym", Environment::Indoor),
    ("library", Environment::Indoor),
    ("cafe", Environment::Indoor),
    ("restaurant", Environment::Indoor),
    ("hallway", Environment::Indoor),
    ("home", Environment::Indoor),
    ("room", Environment::Indoor),
    // waterfront
    ("beach", Environment::Outdoor),
    ("ocean", Environment::Outdoor),
    ("sea", Environment::Outdoor),
    ("lake", Environment::Outdoor),
    ("river", Environment::Outdoor),
    ("pier", Environment::Outdoor),
    ("harbor", Environment::Outdoor),
    ("shore", Environment::Outdoor),
    // landscape
    ("mountain", Environment::Outdoor),
    ("mountains", Environment::Outdoor),
    ("hill", Environment::Outdoor),
    ("forest", Environment::Outdoor),
    ("woods", Environment::Outdoor),
    ("meadow", Environment::Outdoor),
    ("field", Environment::Outdoor),
    ("desert", Environment::Outdoor),
    ("valley", Environment::Outdoor),
    // urban and open places
    ("park", Environment::Outdoor),
    ("garden", Environment::Outdoor),
    ("street", Environment::Outdoor),
    ("city", Environment::Outdoor),
    ("sidewalk", Environment::Outdoor),
    ("rooftop", Environment::Outdoor),
    ("backyard", Environment::Outdoor),
    ("patio", Environment::Outdoor),
    ("plaza", Environment::Outdoor),
];

/// Time-of-day terms and how they attach to the scene phrase.
pub const TIME_OF_DAY: &[(&str, &str)] = &[
    ("golden hour", "at golden hour"),
    ("sunset", "at sunset"),
    ("sunrise", "at sunrise"),
    ("dawn", "at dawn"),
    ("dusk", "at dusk"),
    ("twilight", "at twilight"),
    ("night", "at night"),
    ("nighttime", "at night"),
    ("midday", "at midday"),
    ("noon", "at noon"),
    ("morning", "in the morning"),
    ("afternoon", "in the afternoon"),
    ("evening", "in the evening"),
];

/// Recognised objects and their canonical name.
pub const OBJECTS: &[(&str, &str)] = &[
    ("car", "car"),
    ("bicycle", "bicycle"),
    ("bike", "bicycle"),
    ("motorcycle", "motorcycle"),
    ("boat", "boat"),
    ("dog", "dog"),
    ("puppy", "dog"),
    ("cat", "cat"),
    ("horse", "horse"),
    ("bird", "bird"),
    ("tree", "tree"),
    ("trees", "tree"),
    ("flower", "flower"),
    ("flowers", "flower"),
    ("bench", "bench"),
    ("table", "table"),
    ("chair", "chair"),
    ("sofa", "sofa"),
    ("couch", "sofa"),
    ("window", "window"),
    ("door", "door"),
    ("lamp", "lamp"),
    ("book", "book"),
    ("phone", "phone"),
    ("laptop", "laptop"),
    ("cup", "cup"),
    ("umbrella", "umbrella"),
    ("guitar", "guitar"),
    ("ball", "ball"),
    ("balloon", "balloon"),
    ("fountain", "fountain"),
    ("building", "building"),
    ("camera", "camera"),
];

/// Color words used for clothing pairs.
pub const COLORS: &[&str] = &[
    "red", "blue", "green", "yellow", "orange", "purple", "pink", "white", "black", "gray",
    "grey", "brown", "beige", "navy", "gold", "silver",
];

/// Garments, plural forms included.
pub const GARMENTS: &[&str] = &[
    "dress", "gown", "shirt", "t-shirt", "blouse", "sweater", "hoodie", "jacket", "coat",
    "suit", "skirt", "jeans", "pants", "trousers", "shorts", "uniform", "robe", "raincoat",
];

/// Garments that take no article ("in jeans", not "in a jeans").
pub const PLURAL_GARMENTS: &[&str] = &["jeans", "pants", "trousers", "shorts"];

/// Accessories worn by the subject.
pub const ACCESSORIES: &[&str] = &[
    "sunglasses", "glasses", "hat", "cap", "scarf", "necklace", "earrings", "wristwatch",
    "backpack", "handbag", "headphones", "necktie", "bracelet",
];

/// Subject nouns and their canonical form. People before animals.
pub const SUBJECT_NOUNS: &[(&str, &str)] = &[
    ("woman", "woman"),
    ("lady", "woman"),
    ("female", "woman"),
    ("girl", "girl"),
    ("man", "man"),
    ("gentleman", "man"),
    ("guy", "man"),
    ("male", "man"),
    ("boy", "boy"),
    ("child", "child"),
    ("kid", "child"),
    ("toddler", "toddler"),
    ("baby", "baby"),
    ("couple", "couple"),
    ("people", "group of people"),
    ("person", "person"),
    ("individual", "person"),
    ("dog", "dog"),
    ("cat", "cat"),
];

/// Age cues, used as adjectives.
pub const AGE_TERMS: &[(&str, &str)] = &[
    ("young", "young"),
    ("teenage", "teenage"),
    ("teenager", "teenage"),
    ("middle-aged", "middle-aged"),
    ("elderly", "elderly"),
    ("older", "older"),
];

/// Words that end a "holding a ..." phrase.
pub const HELD_ITEM_STOPWORDS: &[&str] = &[
    "and", "in", "on", "at", "while", "with", "near", "by", "under", "as", "standing",
    "sitting", "walking", "looking",
];

/// Free-text lighting cues.
pub const LIGHTING_TERMS: &[(&str, LightingMood)] = &[
    ("sunny", LightingMood::Bright),
    ("sunlit", LightingMood::Bright),
    ("bright", LightingMood::Bright),
    ("daylight", LightingMood::Bright),
    ("well-lit", LightingMood::Bright),
    ("dim", LightingMood::Dim),
    ("dark", LightingMood::Dim),
    ("shadowy", LightingMood::Dim),
    ("low light", LightingMood::Dim),
    ("candlelit", LightingMood::Dim),
    ("moody", LightingMood::Dim),
    ("night", LightingMood::Dim),
];

/// Free-text framing cues.
pub const FRAMING_TERMS: &[(&str, Framing)] = &[
    ("close-up", Framing::CloseUp),
    ("closeup", Framing::CloseUp),
    ("portrait", Framing::CloseUp),
    ("headshot", Framing::CloseUp),
    ("full body", Framing::Medium),
    ("landscape", Framing::Wide),
    ("panorama", Framing::Wide),
    ("aerial", Framing::Wide),
    ("wide view", Framing::Wide),
];
