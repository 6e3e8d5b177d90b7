//! Turning an analysis into a shot plan.
//!
//! - [`extract`]: analysis result to compact scene/subject context
//! - [`plan`]: context and duration to a seeded, non-repeating [`Timeline`]
//! - [`render`]: timeline to timestamp and narrative prompts
//!
//! Everything here is pure: no I/O, and randomness only through an explicit seed.
//!
//! [`Timeline`]: shotplan_models::Timeline

pub mod error;
pub mod extractor;
pub mod planner;
pub mod renderer;
pub mod terms;
pub mod vocabulary;

pub use error::{PlanError, PlanResult};
pub use extractor::{extract, ContextConfig};
pub use planner::{plan, segment_count, PlannerConfig};
pub use renderer::{render, RenderConfig, RenderedPrompts};
