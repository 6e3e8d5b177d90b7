//! The image-to-prompt pipeline.
//!
//! Validation runs before any provider is called. After that the only
//! fallible stage is planning, and its inputs have already been checked, so
//! a readable image with a valid request always produces prompts.

use std::future::Future;
use std::path::Path;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use shotplan_models::{AnalysisResult, ExtractedContext, GenerationRequest, RequestId, Timeline};
use shotplan_planner::{extract, plan, render, RenderedPrompts};
use shotplan_vision::{FallbackChain, ImagePayload, LocalProvider};
use tracing::Instrument;
use validator::Validate;

use crate::config::PipelineConfig;
use crate::error::PipelineResult;
use crate::logging::RequestLogger;

/// Everything produced for one image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct GenerationOutput {
    pub request_id: RequestId,
    pub generated_at: DateTime<Utc>,
    pub analysis: AnalysisResult,
    pub context: ExtractedContext,
    pub timeline: Timeline,
    pub prompts: RenderedPrompts,
}

/// One image's entry in a batch report. Exactly one of `output` and `error`
/// is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct BatchEntry {
    /// File path the image was read from
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<GenerationOutput>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<BatchError>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct BatchError {
    pub message: String,
    /// The image or request was unusable, as opposed to a setup problem
    pub input_error: bool,
}

impl BatchEntry {
    pub fn new(source: impl Into<String>, result: PipelineResult<GenerationOutput>) -> Self {
        let (output, error) = match result {
            Ok(output) => (Some(output), None),
            Err(e) => (
                None,
                Some(BatchError {
                    message: e.to_string(),
                    input_error: e.is_input_error(),
                }),
            ),
        };
        Self {
            source: source.into(),
            output,
            error,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.output.is_some()
    }
}

/// Runs analysis, extraction, planning and rendering for images.
pub struct Generator {
    chain: FallbackChain,
    config: PipelineConfig,
}

impl Generator {
    /// Build the provider chain described by `config`.
    pub fn new(config: PipelineConfig) -> PipelineResult<Self> {
        let chain = FallbackChain::from_specs(config.providers.clone(), LocalProvider::shared())?;
        Self::with_chain(chain, config)
    }

    /// Use an already assembled chain. `config.providers` is ignored.
    pub fn with_chain(chain: FallbackChain, config: PipelineConfig) -> PipelineResult<Self> {
        config.planner.validate()?;
        Ok(Self { chain, config })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn chain(&self) -> &FallbackChain {
        &self.chain
    }

    /// A request carrying the configured defaults.
    pub fn default_request(&self) -> GenerationRequest {
        let request = GenerationRequest::new(self.config.default_duration_secs)
            .with_format(self.config.default_format);
        match self.config.seed {
            Some(seed) => request.with_seed(seed),
            None => request,
        }
    }

    /// Reject a request that could never be planned.
    pub fn check_request(&self, request: &GenerationRequest) -> PipelineResult<()> {
        request.validate()?;
        self.config.planner.check_duration(request.duration_secs)?;
        if let Some(action) = &request.custom_action {
            self.config.planner.check_custom_action(action)?;
        }
        Ok(())
    }

    /// Generate prompts for encoded image bytes.
    pub async fn generate(
        &self,
        bytes: impl Into<Vec<u8>>,
        request: &GenerationRequest,
    ) -> PipelineResult<GenerationOutput> {
        let logger = RequestLogger::new("bytes");
        traced(&logger, async {
            self.check_request(request)?;
            let image = ImagePayload::from_bytes(bytes)?;
            self.run(&image, request, &logger).await
        })
        .await
    }

    /// Generate prompts for an image file.
    pub async fn generate_from_path(
        &self,
        path: impl AsRef<Path>,
        request: &GenerationRequest,
    ) -> PipelineResult<GenerationOutput> {
        let path = path.as_ref();
        let logger = RequestLogger::new(&path.display().to_string());
        traced(&logger, async {
            self.check_request(request)?;
            let image = ImagePayload::from_path(path).await?;
            self.run(&image, request, &logger).await
        })
        .await
    }

    /// Generate prompts for an already decoded image.
    pub async fn generate_image(
        &self,
        image: &ImagePayload,
        request: &GenerationRequest,
    ) -> PipelineResult<GenerationOutput> {
        let logger = RequestLogger::new("payload");
        traced(&logger, async {
            self.check_request(request)?;
            self.run(image, request, &logger).await
        })
        .await
    }

    async fn run(
        &self,
        image: &ImagePayload,
        request: &GenerationRequest,
        logger: &RequestLogger,
    ) -> PipelineResult<GenerationOutput> {
        logger.started(image, request);

        let analysis = self.chain.analyze(image, &self.config.chain).await;
        logger.analyzed(&analysis);

        let context = extract(&analysis, &self.config.context);
        let seed = request.seed.or(self.config.seed);
        let timeline = plan(
            &context,
            request.duration_secs,
            request.custom_action.as_deref(),
            seed,
            &self.config.planner,
        )?;
        logger.planned(&timeline);

        let prompts = render(&timeline, request.format, &self.config.render);
        logger.rendered(&prompts);

        Ok(GenerationOutput {
            request_id: logger.request_id().clone(),
            generated_at: Utc::now(),
            analysis,
            context,
            timeline,
            prompts,
        })
    }
}

/// Run `stages` inside the request span, logging a failure there too.
async fn traced<F>(logger: &RequestLogger, stages: F) -> PipelineResult<GenerationOutput>
where
    F: Future<Output = PipelineResult<GenerationOutput>>,
{
    async {
        let result = stages.await;
        if let Err(e) = &result {
            logger.failed(e);
        }
        result
    }
    .instrument(logger.span())
    .await
}
