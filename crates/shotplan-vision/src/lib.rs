//! Image analysis providers and the fallback chain.
//!
//! This crate turns a validated image into an [`AnalysisResult`]:
//! - [`AnalysisProvider`] adapters for OpenAI, Gemini, Hugging Face and a
//!   guaranteed local captioner
//! - Retry with exponential backoff for transient provider failures
//! - [`FallbackChain`], which tries providers in priority order and always
//!   answers, falling back to the local captioner when every remote fails
//!
//! [`AnalysisResult`]: shotplan_models::AnalysisResult

pub mod chain;
pub mod error;
pub mod gemini;
pub mod http;
pub mod huggingface;
pub mod image;
pub mod local;
pub mod metrics;
pub mod openai;
pub mod provider;
pub mod report;
pub mod retry;

pub use chain::{ChainOptions, FallbackChain};
pub use error::{ImageError, ImageResult, ProviderError, ProviderResult};
pub use gemini::GeminiVisionProvider;
pub use huggingface::HuggingFaceCaptionProvider;
pub use image::ImagePayload;
pub use local::LocalProvider;
pub use openai::OpenAiVisionProvider;
pub use provider::{AnalysisProvider, CallContext, RawAnalysis};
pub use retry::{retry_with_policy, RetryOutcome};
