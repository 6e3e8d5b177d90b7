//! Pipeline tests against mocked provider backends.

use std::collections::HashMap;
use std::io::Write;

use serde_json::json;
use shotplan_cli::{GenerationOutput, Generator, PipelineConfig, PipelineError};
use shotplan_models::{ErrorClass, GenerationRequest, OutputFormat, ProviderKind};
use shotplan_planner::{segment_count, PlanError};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const OPENAI_PATH: &str = "/v1/chat/completions";
const GEMINI_PATH: &str = "/v1beta/models/gemini-1.5-flash:generateContent";
const HF_PATH: &str = "/models/Salesforce/blip-image-captioning-base";
const HF_CAPTION: &str = "a woman wearing a red dress standing in a park";

struct Backends {
    openai: MockServer,
    gemini: MockServer,
    huggingface: MockServer,
}

impl Backends {
    async fn start() -> Self {
        Self {
            openai: MockServer::start().await,
            gemini: MockServer::start().await,
            huggingface: MockServer::start().await,
        }
    }

    /// All three providers keyed and pointed at the mocks, with millisecond backoff.
    fn config(&self, extra: &[(&str, &str)]) -> PipelineConfig {
        let mut vars: HashMap<String, String> = [
            ("OPENAI_API_KEY", "sk-test".to_string()),
            ("OPENAI_BASE_URL", self.openai.uri()),
            ("GEMINI_API_KEY", "g-test".to_string()),
            ("GEMINI_BASE_URL", self.gemini.uri()),
            ("HUGGINGFACE_API_KEY", "hf_test".to_string()),
            ("HUGGINGFACE_BASE_URL", self.huggingface.uri()),
            ("SHOTPLAN_RETRY_BASE_MS", "1".to_string()),
            ("SHOTPLAN_RETRY_MAX_MS", "5".to_string()),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();
        for (key, value) in extra {
            vars.insert(key.to_string(), value.to_string());
        }
        PipelineConfig::from_lookup(|key| vars.get(key).cloned())
    }

    fn generator(&self, extra: &[(&str, &str)]) -> Generator {
        Generator::new(self.config(extra)).expect("Failed to build generator")
    }

    async fn request_counts(&self) -> (usize, usize, usize) {
        (
            received(&self.openai).await,
            received(&self.gemini).await,
            received(&self.huggingface).await,
        )
    }
}

async fn received(server: &MockServer) -> usize {
    server
        .received_requests()
        .await
        .map(|requests| requests.len())
        .unwrap_or(0)
}

async fn respond(server: &MockServer, route: &str, template: ResponseTemplate) {
    Mock::given(method("POST"))
        .and(path(route))
        .respond_with(template)
        .mount(server)
        .await;
}

async fn caption_succeeds(server: &MockServer) {
    respond(
        server,
        HF_PATH,
        ResponseTemplate::new(200).set_body_json(json!([{ "generated_text": HF_CAPTION }])),
    )
    .await;
}

fn png(width: u32, height: u32) -> Vec<u8> {
    let mut bytes = Vec::new();
    image::RgbImage::new(width, height)
        .write_to(
            &mut std::io::Cursor::new(&mut bytes),
            image::ImageOutputFormat::Png,
        )
        .expect("Failed to encode test image");
    bytes
}

/// Transient failures on the first two providers fall through to the third.
#[tokio::test]
async fn test_third_provider_answers_after_transient_failures() {
    dotenvy::dotenv().ok();
    let backends = Backends::start().await;
    respond(&backends.openai, OPENAI_PATH, ResponseTemplate::new(503)).await;
    respond(&backends.gemini, GEMINI_PATH, ResponseTemplate::new(429)).await;
    caption_succeeds(&backends.huggingface).await;

    let output = backends
        .generator(&[])
        .generate(png(64, 96), &GenerationRequest::new(10).with_seed(3))
        .await
        .expect("Generation should succeed");

    assert_eq!(
        output.analysis.provider_used,
        "huggingface:Salesforce/blip-image-captioning-base"
    );
    assert!(!output.analysis.degraded);
    assert_eq!(output.analysis.basic_description, HF_CAPTION);

    let failures = &output.analysis.failed_attempts;
    assert_eq!(failures.len(), 2);
    assert_eq!(failures[0].provider, ProviderKind::OpenAi);
    assert_eq!(failures[0].error_class, ErrorClass::ModelLoading);
    assert_eq!(failures[0].attempts, 3);
    assert_eq!(failures[1].provider, ProviderKind::Gemini);
    assert_eq!(failures[1].error_class, ErrorClass::RateLimited);

    assert_eq!(backends.request_counts().await, (3, 3, 1));
    assert!(output.context.subject_phrase.contains("woman"));
}

/// Every remote provider failing still yields a local description.
#[tokio::test]
async fn test_total_exhaustion_uses_local_provider() {
    dotenvy::dotenv().ok();
    let backends = Backends::start().await;
    respond(&backends.openai, OPENAI_PATH, ResponseTemplate::new(401)).await;
    respond(&backends.gemini, GEMINI_PATH, ResponseTemplate::new(500)).await;
    respond(&backends.huggingface, HF_PATH, ResponseTemplate::new(200).set_body_json(json!([]))).await;

    let output = backends
        .generator(&[])
        .generate(png(48, 96), &GenerationRequest::new(12))
        .await
        .expect("Generation should succeed");

    assert!(output.analysis.degraded);
    assert!(output.analysis.provider_used.starts_with("local:"));
    assert!(!output.analysis.basic_description.trim().is_empty());

    let classes: Vec<ErrorClass> = output
        .analysis
        .failed_attempts
        .iter()
        .map(|f| f.error_class)
        .collect();
    assert_eq!(
        classes,
        vec![
            ErrorClass::InvalidCredential,
            ErrorClass::Server,
            ErrorClass::InvalidResponse
        ]
    );
    // Terminal failures are not retried.
    assert_eq!(backends.request_counts().await, (1, 1, 1));
}

/// A pinned provider without fallback skips the rest of the chain.
#[tokio::test]
async fn test_pinned_provider_without_fallback() {
    dotenvy::dotenv().ok();
    let backends = Backends::start().await;
    respond(&backends.gemini, GEMINI_PATH, ResponseTemplate::new(500)).await;
    caption_succeeds(&backends.huggingface).await;

    let generator = backends.generator(&[
        ("SHOTPLAN_PROVIDER", "gemini"),
        ("SHOTPLAN_FALLBACK_ENABLED", "false"),
    ]);
    let output = generator
        .generate(png(32, 32), &GenerationRequest::new(10))
        .await
        .expect("Generation should succeed");

    assert!(output.analysis.degraded);
    assert_eq!(output.analysis.failed_attempts.len(), 1);
    assert_eq!(backends.request_counts().await, (0, 1, 0));
}

#[tokio::test]
async fn test_short_duration_rejected_before_any_provider() {
    dotenvy::dotenv().ok();
    let backends = Backends::start().await;
    caption_succeeds(&backends.huggingface).await;

    let err = backends
        .generator(&[])
        .generate(png(32, 32), &GenerationRequest::new(2))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        PipelineError::Plan(PlanError::DurationOutOfRange { duration: 2, min: 5, .. })
    ));
    assert!(err.is_input_error());
    assert_eq!(backends.request_counts().await, (0, 0, 0));
}

#[tokio::test]
async fn test_corrupt_image_rejected_before_any_provider() {
    dotenvy::dotenv().ok();
    let backends = Backends::start().await;

    let mut bytes = png(32, 32);
    bytes.truncate(12);
    let err = backends
        .generator(&[])
        .generate(bytes, &GenerationRequest::new(10))
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::Image(_)));
    assert_eq!(backends.request_counts().await, (0, 0, 0));
}

/// A valid header over a cut-off pixel stream is still a bad image.
#[tokio::test]
async fn test_truncated_image_body_rejected_before_any_provider() {
    dotenvy::dotenv().ok();
    let backends = Backends::start().await;
    caption_succeeds(&backends.huggingface).await;

    let mut bytes = png(64, 64);
    bytes.truncate(bytes.len() - 20);
    let err = backends
        .generator(&[])
        .generate(bytes, &GenerationRequest::new(10))
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::Image(_)));
    assert!(err.is_input_error());
    assert_eq!(backends.request_counts().await, (0, 0, 0));
}

#[tokio::test]
async fn test_ten_seconds_plans_bounded_segments() {
    dotenvy::dotenv().ok();
    let backends = Backends::start().await;
    caption_succeeds(&backends.huggingface).await;
    let generator = backends.generator(&[("SHOTPLAN_PROVIDERS", "huggingface")]);

    let output = generator
        .generate(png(64, 64), &GenerationRequest::new(10).with_seed(11))
        .await
        .expect("Generation should succeed");

    let planner = &generator.config().planner;
    let segments = &output.timeline.segments;
    assert_eq!(segments.len() as u32, segment_count(10, planner));
    assert_eq!(segments.first().map(|s| s.start_secs), Some(0));
    assert_eq!(segments.last().map(|s| s.end_secs), Some(10));
    for pair in segments.windows(2) {
        assert_eq!(pair[0].end_secs, pair[1].start_secs);
        assert_ne!(pair[0].shot_pair(), pair[1].shot_pair());
    }
    for segment in segments {
        let length = segment.end_secs - segment.start_secs;
        assert!(length >= planner.min_segment_secs && length <= planner.max_segment_secs);
    }

    let timestamp = output.prompts.timestamp.expect("timestamp requested");
    let starts: Vec<u32> = timestamp
        .split('[')
        .skip(1)
        .map(|entry| {
            entry
                .split('s')
                .next()
                .and_then(|n| n.parse().ok())
                .expect("entry starts with seconds")
        })
        .collect();
    assert_eq!(starts.len(), segments.len());
    assert!(starts.windows(2).all(|w| w[0] < w[1]));
}

#[tokio::test]
async fn test_custom_action_appears_exactly_once() {
    dotenvy::dotenv().ok();
    let backends = Backends::start().await;
    caption_succeeds(&backends.huggingface).await;
    let generator = backends.generator(&[("SHOTPLAN_PROVIDERS", "huggingface")]);

    for (action, duration) in [("waves hello", 8), ("settles", 20), ("is revealed", 20)] {
        for seed in 0..20 {
            let request = GenerationRequest::new(duration)
                .with_custom_action(action)
                .with_seed(seed);
            let output = generator
                .generate(png(64, 64), &request)
                .await
                .expect("Generation should succeed");

            let carrying = output
                .timeline
                .segments
                .iter()
                .filter(|s| s.action_text.contains(action))
                .count();
            assert_eq!(carrying, 1, "{:?} seed {}", action, seed);

            let timestamp = output.prompts.timestamp.expect("timestamp requested");
            let narrative = output.prompts.narrative.expect("narrative requested");
            assert_eq!(timestamp.matches(action).count(), 1, "{:?} seed {}", action, seed);
            assert_eq!(narrative.matches(action).count(), 1, "{:?} seed {}", action, seed);
        }
    }
}

#[tokio::test]
async fn test_reads_image_from_file() {
    dotenvy::dotenv().ok();
    let backends = Backends::start().await;
    let generator = backends.generator(&[("SHOTPLAN_PROVIDER", "local")]);

    let mut file = tempfile::Builder::new()
        .suffix(".png")
        .tempfile()
        .expect("Failed to create temp file");
    file.write_all(&png(90, 160)).expect("Failed to write image");

    let request = GenerationRequest::new(15)
        .with_seed(5)
        .with_format(OutputFormat::Narrative);
    let output = generator
        .generate_from_path(file.path(), &request)
        .await
        .expect("Generation should succeed");

    assert!(output.analysis.provider_used.starts_with("local:"));
    assert!(output.prompts.timestamp.is_none());
    let narrative = output.prompts.narrative.expect("narrative requested");
    assert!(narrative.starts_with("Opening on"));
    assert_eq!(backends.request_counts().await, (0, 0, 0));

    let missing = generator
        .generate_from_path(file.path().with_extension("missing"), &request)
        .await
        .unwrap_err();
    assert!(matches!(missing, PipelineError::Image(_)));
}

#[tokio::test]
async fn test_concurrent_images_share_one_local_model() {
    dotenvy::dotenv().ok();
    let backends = Backends::start().await;
    let generator = backends.generator(&[("SHOTPLAN_PROVIDER", "local")]);
    let request = GenerationRequest::new(10);

    let images: Vec<Vec<u8>> = (1..=6).map(|i| png(16 * i, 16)).collect();
    let results = futures::future::join_all(
        images
            .into_iter()
            .map(|bytes| generator.generate(bytes, &request)),
    )
    .await;

    assert!(results.iter().all(Result::is_ok));
    assert!(generator.chain().local().load_count() <= 1);
}

#[tokio::test]
async fn test_output_serializes_with_schema() {
    dotenvy::dotenv().ok();
    let backends = Backends::start().await;
    let generator = backends.generator(&[("SHOTPLAN_PROVIDER", "local")]);

    let output = generator
        .generate(png(32, 32), &GenerationRequest::new(10).with_seed(1))
        .await
        .expect("Generation should succeed");

    let value = serde_json::to_value(&output).expect("Failed to serialize output");
    for field in ["request_id", "generated_at", "analysis", "context", "timeline", "prompts"] {
        assert!(value.get(field).is_some(), "missing {}", field);
    }
    let parsed: GenerationOutput = serde_json::from_value(value).expect("Failed to parse output");
    assert_eq!(parsed.timeline, output.timeline);

    let schema = serde_json::to_value(schemars::schema_for!(GenerationOutput))
        .expect("Failed to serialize schema");
    assert!(schema["properties"]["prompts"].is_object());
}
