//! Structured logging for one generation request.
//!
//! Each request gets a span carrying its id and image source. The provider
//! that answered and the plan seed are recorded on the span as soon as they
//! are known, so every later event, and the span close, carries them.

use shotplan_models::{AnalysisResult, GenerationRequest, RequestId, Timeline};
use shotplan_planner::RenderedPrompts;
use shotplan_vision::ImagePayload;
use tracing::field::{display, Empty};
use tracing::{debug, error, info, warn, Span};

use crate::error::PipelineError;

/// Lifecycle events of one generation request.
#[derive(Debug, Clone)]
pub struct RequestLogger {
    request_id: RequestId,
    span: Span,
}

impl RequestLogger {
    /// # Arguments
    /// * `source` - Where the image came from (a file path, or "bytes")
    pub fn new(source: &str) -> Self {
        let request_id = RequestId::new();
        let span = tracing::info_span!(
            "request",
            request_id = %request_id,
            source = %source,
            provider = Empty,
            seed = Empty,
        );
        Self { request_id, span }
    }

    pub fn request_id(&self) -> &RequestId {
        &self.request_id
    }

    /// Span to instrument the request future with.
    pub fn span(&self) -> Span {
        self.span.clone()
    }

    pub fn started(&self, image: &ImagePayload, request: &GenerationRequest) {
        info!(
            width = image.width(),
            height = image.height(),
            format = image.format_name(),
            duration_secs = request.duration_secs,
            custom_action = request.custom_action.is_some(),
            "Generation started"
        );
    }

    pub fn analyzed(&self, analysis: &AnalysisResult) {
        self.span
            .record("provider", display(&analysis.provider_used));
        let failed = analysis.failed_attempts.len();
        if analysis.degraded {
            warn!(failed, "Remote providers exhausted, using local description");
        } else {
            info!(failed, "Image analyzed");
        }
    }

    pub fn planned(&self, timeline: &Timeline) {
        self.span.record("seed", timeline.seed);
        debug!(
            segments = timeline.segments.len(),
            duration_secs = timeline.duration_secs,
            "Timeline planned"
        );
    }

    pub fn rendered(&self, prompts: &RenderedPrompts) {
        info!(
            timestamp = prompts.timestamp.is_some(),
            narrative = prompts.narrative.is_some(),
            "Prompts rendered"
        );
    }

    pub fn failed(&self, err: &PipelineError) {
        if err.is_input_error() {
            warn!("Request rejected: {}", err);
        } else {
            error!("Generation failed: {}", err);
        }
    }
}
