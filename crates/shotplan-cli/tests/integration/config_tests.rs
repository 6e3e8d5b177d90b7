//! Chain assembly from configuration.

use std::collections::HashMap;

use shotplan_cli::{Generator, PipelineConfig, PipelineError};
use shotplan_models::{ErrorClass, GenerationRequest, ProviderKind};
use shotplan_vision::ChainOptions;

fn config(vars: &[(&str, &str)]) -> PipelineConfig {
    let vars: HashMap<&str, &str> = vars.iter().copied().collect();
    PipelineConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string()))
}

#[test]
fn test_chain_follows_configured_priority() {
    dotenvy::dotenv().ok();
    let generator = Generator::new(config(&[
        ("SHOTPLAN_PROVIDERS", "gemini,openai,huggingface"),
        ("OPENAI_API_KEY", "sk-test"),
        ("GEMINI_API_KEY", "g-test"),
        ("HUGGINGFACE_API_KEY", "hf_test"),
    ]))
    .expect("Failed to build generator");

    let identifiers: Vec<String> = generator.chain().specs().map(|s| s.identifier()).collect();
    assert_eq!(
        identifiers,
        vec![
            "gemini:gemini-1.5-flash",
            "openai:gpt-4o-mini",
            "huggingface:Salesforce/blip-image-captioning-base",
        ]
    );

    let pinned = generator
        .chain()
        .order(&ChainOptions::pinned(ProviderKind::HuggingFace));
    assert_eq!(
        pinned,
        vec![ProviderKind::HuggingFace, ProviderKind::Gemini, ProviderKind::OpenAi]
    );
    let alone = generator
        .chain()
        .order(&ChainOptions::pinned(ProviderKind::OpenAi).with_fallback(false));
    assert_eq!(alone, vec![ProviderKind::OpenAi]);
}

#[tokio::test]
async fn test_providers_without_keys_are_reported_not_configured() {
    dotenvy::dotenv().ok();
    let generator = Generator::new(config(&[])).expect("Failed to build generator");
    assert_eq!(generator.chain().specs().count(), 3);

    let mut bytes = Vec::new();
    image::RgbImage::new(16, 16)
        .write_to(
            &mut std::io::Cursor::new(&mut bytes),
            image::ImageOutputFormat::Png,
        )
        .expect("Failed to encode test image");
    let output = generator
        .generate(bytes, &GenerationRequest::new(10))
        .await
        .expect("Generation should succeed");

    assert!(output.analysis.degraded);
    let failures = &output.analysis.failed_attempts;
    assert_eq!(failures.len(), 3);
    assert!(failures
        .iter()
        .all(|f| f.error_class == ErrorClass::NotConfigured && f.attempts == 1));
}

#[test]
fn test_unworkable_segment_bounds_rejected() {
    dotenvy::dotenv().ok();
    let result = Generator::new(config(&[
        ("SHOTPLAN_MIN_SEGMENT_SECS", "4"),
        ("SHOTPLAN_MAX_SEGMENT_SECS", "5"),
    ]));
    let err = result.err().expect("config should be rejected");
    assert!(matches!(err, PipelineError::Plan(_)));
}
