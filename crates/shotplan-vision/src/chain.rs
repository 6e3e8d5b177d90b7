//! The fallback chain.
//!
//! Providers are tried in priority order, each under its own retry policy
//! and timeout. The first success wins. When nothing succeeds the local
//! provider answers, so [`FallbackChain::analyze`] never fails.

use std::sync::Arc;

use shotplan_models::{AnalysisResult, ErrorClass, FailedAttempt, ProviderKind, ProviderSpec};
use tracing::{info, instrument, warn};

use crate::error::{ProviderError, ProviderResult};
use crate::gemini::GeminiVisionProvider;
use crate::huggingface::HuggingFaceCaptionProvider;
use crate::image::ImagePayload;
use crate::local::LocalProvider;
use crate::metrics;
use crate::openai::OpenAiVisionProvider;
use crate::provider::AnalysisProvider;
use crate::retry::{retry_with_policy, RetryOutcome};

/// Per-request chain options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainOptions {
    /// Provider to try first (or only, without fallback)
    pub pinned: Option<ProviderKind>,
    /// Whether other providers may be tried after the pinned one
    pub fallback_enabled: bool,
}

impl Default for ChainOptions {
    fn default() -> Self {
        Self {
            pinned: None,
            fallback_enabled: true,
        }
    }
}

impl ChainOptions {
    pub fn pinned(kind: ProviderKind) -> Self {
        Self {
            pinned: Some(kind),
            ..Default::default()
        }
    }

    pub fn with_fallback(mut self, enabled: bool) -> Self {
        self.fallback_enabled = enabled;
        self
    }
}

struct ChainEntry {
    spec: ProviderSpec,
    provider: Arc<dyn AnalysisProvider>,
}

/// Ordered providers plus the guaranteed local provider.
pub struct FallbackChain {
    entries: Vec<ChainEntry>,
    local: LocalProvider,
}

impl FallbackChain {
    /// An empty chain that always answers locally.
    pub fn new(local: LocalProvider) -> Self {
        Self {
            entries: Vec::new(),
            local,
        }
    }

    /// Build the remote adapters for `specs`.
    ///
    /// `local` specs are skipped; the local provider always ends the chain.
    pub fn from_specs(
        specs: impl IntoIterator<Item = ProviderSpec>,
        local: LocalProvider,
    ) -> ProviderResult<Self> {
        let mut chain = Self::new(local);
        for spec in specs {
            let provider: Arc<dyn AnalysisProvider> = match spec.kind {
                ProviderKind::OpenAi => {
                    Arc::new(OpenAiVisionProvider::new(spec.transport.clone())?)
                }
                ProviderKind::Gemini => {
                    Arc::new(GeminiVisionProvider::new(spec.transport.clone())?)
                }
                ProviderKind::HuggingFace => {
                    Arc::new(HuggingFaceCaptionProvider::new(spec.transport.clone())?)
                }
                ProviderKind::Local => continue,
            };
            chain = chain.with_provider(spec, provider);
        }
        Ok(chain)
    }

    /// Add a provider. Entries stay sorted by priority; ties keep insertion order.
    pub fn with_provider(mut self, spec: ProviderSpec, provider: Arc<dyn AnalysisProvider>) -> Self {
        self.entries.push(ChainEntry { spec, provider });
        self.entries.sort_by_key(|e| e.spec.priority);
        self
    }

    pub fn specs(&self) -> impl Iterator<Item = &ProviderSpec> {
        self.entries.iter().map(|e| &e.spec)
    }

    pub fn local(&self) -> &LocalProvider {
        &self.local
    }

    /// Remote providers that `options` allows, in the order they are tried.
    pub fn order(&self, options: &ChainOptions) -> Vec<ProviderKind> {
        self.plan(options).iter().map(|e| e.spec.kind).collect()
    }

    fn plan(&self, options: &ChainOptions) -> Vec<&ChainEntry> {
        match options.pinned {
            None => self.entries.iter().collect(),
            Some(ProviderKind::Local) => Vec::new(),
            Some(pinned) => {
                let (mut first, rest): (Vec<_>, Vec<_>) =
                    self.entries.iter().partition(|e| e.spec.kind == pinned);
                if options.fallback_enabled {
                    first.extend(rest);
                }
                first
            }
        }
    }

    /// Analyze an image. Never fails.
    #[instrument(skip_all, fields(width = image.width(), height = image.height()))]
    pub async fn analyze(&self, image: &ImagePayload, options: &ChainOptions) -> AnalysisResult {
        let plan = self.plan(options);
        let mut failed = Vec::new();

        if let Some(pinned) = options.pinned.filter(|k| k.is_remote()) {
            if !plan.iter().any(|e| e.spec.kind == pinned) {
                warn!(provider = %pinned, "Pinned provider is not configured");
                failed.push(FailedAttempt {
                    provider: pinned,
                    error_class: ErrorClass::NotConfigured,
                    attempts: 0,
                    message: "provider is not in the configured chain".to_string(),
                });
            }
        }

        for entry in plan {
            let kind = entry.spec.kind;
            let timeout = entry.spec.transport.timeout;
            let provider = Arc::clone(&entry.provider);

            let outcome = retry_with_policy(&entry.spec.retry, kind, |call| {
                let provider = Arc::clone(&provider);
                async move {
                    match tokio::time::timeout(timeout, provider.analyze(image, call)).await {
                        Ok(result) => result,
                        Err(_) => Err(ProviderError::Timeout(timeout)),
                    }
                }
            })
            .await;

            match outcome {
                RetryOutcome::Success { value, attempts } => {
                    let provider_used = entry.spec.identifier();
                    info!(
                        provider = %provider_used,
                        attempts,
                        skipped = failed.len(),
                        "Image analyzed"
                    );
                    return value.into_result(provider_used, image, failed, false);
                }
                RetryOutcome::Failed { error, attempts } => {
                    warn!(
                        provider = %kind,
                        attempts,
                        error_class = %error.class(),
                        "Provider failed, falling through: {}",
                        error
                    );
                    failed.push(FailedAttempt {
                        provider: kind,
                        error_class: error.class(),
                        attempts,
                        message: error.to_string(),
                    });
                }
            }
        }

        let reason = if options.pinned == Some(ProviderKind::Local) {
            "pinned"
        } else if failed.is_empty() {
            "no_providers"
        } else {
            "exhausted"
        };
        metrics::record_local_fallback(reason);
        info!(reason, failed = failed.len(), "Using local provider");

        self.local
            .describe(image)
            .await
            .into_result(LocalProvider::identifier(), image, failed, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::test_support::png_bytes;
    use crate::provider::{CallContext, RawAnalysis};
    use async_trait::async_trait;
    use shotplan_models::{RetryPolicy, TransportConfig};
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    type Script = Box<dyn Fn(u32) -> ProviderResult<RawAnalysis> + Send + Sync>;

    struct ScriptedProvider {
        kind: ProviderKind,
        calls: AtomicU32,
        script: Script,
    }

    impl ScriptedProvider {
        fn new(kind: ProviderKind, script: Script) -> Arc<Self> {
            Arc::new(Self {
                kind,
                calls: AtomicU32::new(0),
                script,
            })
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl AnalysisProvider for ScriptedProvider {
        fn kind(&self) -> ProviderKind {
            self.kind
        }

        async fn analyze(
            &self,
            _image: &ImagePayload,
            call: CallContext,
        ) -> ProviderResult<RawAnalysis> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            (self.script)(call.attempt)
        }
    }

    struct SlowProvider;

    #[async_trait]
    impl AnalysisProvider for SlowProvider {
        fn kind(&self) -> ProviderKind {
            ProviderKind::OpenAi
        }

        async fn analyze(
            &self,
            _image: &ImagePayload,
            _call: CallContext,
        ) -> ProviderResult<RawAnalysis> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(RawAnalysis::from_description("too late"))
        }
    }

    fn spec(kind: ProviderKind, priority: u32) -> ProviderSpec {
        ProviderSpec::new(kind, priority, TransportConfig::new("http://unused", "test-model"))
            .with_retry(
                RetryPolicy::default()
                    .with_base_delay(Duration::from_millis(1))
                    .with_max_delay(Duration::from_millis(2)),
            )
    }

    fn loading() -> Script {
        Box::new(|_| Err(ProviderError::ModelLoading { retry_after: None }))
    }

    fn caption(text: &'static str) -> Script {
        Box::new(move |_| Ok(RawAnalysis::from_description(text)))
    }

    fn image() -> ImagePayload {
        ImagePayload::from_bytes(png_bytes(32, 24)).unwrap()
    }

    #[tokio::test]
    async fn test_third_provider_answers_after_transient_failures() {
        let openai = ScriptedProvider::new(ProviderKind::OpenAi, loading());
        let gemini = ScriptedProvider::new(ProviderKind::Gemini, loading());
        let hf = ScriptedProvider::new(ProviderKind::HuggingFace, caption("a dog on a beach"));
        let chain = FallbackChain::new(LocalProvider::new())
            .with_provider(spec(ProviderKind::HuggingFace, 2), hf.clone())
            .with_provider(spec(ProviderKind::OpenAi, 0), openai.clone())
            .with_provider(spec(ProviderKind::Gemini, 1), gemini.clone());

        let result = chain.analyze(&image(), &ChainOptions::default()).await;

        assert_eq!(result.basic_description, "a dog on a beach");
        assert_eq!(result.provider_used, "huggingface:test-model");
        assert!(!result.degraded);
        assert_eq!(openai.calls(), 3);
        assert_eq!(gemini.calls(), 3);
        assert_eq!(hf.calls(), 1);

        let failed: Vec<_> = result.failed_attempts.iter().map(|f| f.provider).collect();
        assert_eq!(failed, vec![ProviderKind::OpenAi, ProviderKind::Gemini]);
        assert!(result
            .failed_attempts
            .iter()
            .all(|f| f.error_class == ErrorClass::ModelLoading && f.attempts == 3));
    }

    #[tokio::test]
    async fn test_total_exhaustion_uses_local() {
        let openai = ScriptedProvider::new(
            ProviderKind::OpenAi,
            Box::new(|_| Err(ProviderError::InvalidCredential("401".into()))),
        );
        let gemini = ScriptedProvider::new(ProviderKind::Gemini, loading());
        let chain = FallbackChain::new(LocalProvider::new())
            .with_provider(spec(ProviderKind::OpenAi, 0), openai.clone())
            .with_provider(spec(ProviderKind::Gemini, 1), gemini);

        let result = chain.analyze(&image(), &ChainOptions::default()).await;

        assert!(result.degraded);
        assert!(!result.basic_description.is_empty());
        assert_eq!(result.provider_used, "local:preview-captioner");
        assert_eq!(result.failed_attempts.len(), 2);
        assert_eq!(openai.calls(), 1);
        assert!(result.technical_details.is_some());
    }

    #[tokio::test]
    async fn test_empty_chain_answers_locally() {
        let chain = FallbackChain::new(LocalProvider::new());
        let result = chain.analyze(&image(), &ChainOptions::default()).await;

        assert!(result.degraded);
        assert!(result.failed_attempts.is_empty());
    }

    #[test]
    fn test_pinning_order() {
        use ProviderKind::*;

        let mut chain = FallbackChain::new(LocalProvider::new());
        for (priority, kind) in [OpenAi, Gemini, HuggingFace].into_iter().enumerate() {
            chain = chain.with_provider(
                spec(kind, priority as u32),
                ScriptedProvider::new(kind, loading()),
            );
        }

        assert_eq!(
            chain.order(&ChainOptions::default()),
            vec![OpenAi, Gemini, HuggingFace]
        );
        assert_eq!(
            chain.order(&ChainOptions::pinned(Gemini)),
            vec![Gemini, OpenAi, HuggingFace]
        );
        assert_eq!(
            chain.order(&ChainOptions::pinned(Gemini).with_fallback(false)),
            vec![Gemini]
        );
        assert!(chain.order(&ChainOptions::pinned(Local)).is_empty());
    }

    #[tokio::test]
    async fn test_pinned_without_fallback_skips_others() {
        let openai = ScriptedProvider::new(ProviderKind::OpenAi, caption("unused"));
        let gemini = ScriptedProvider::new(
            ProviderKind::Gemini,
            Box::new(|_| Err(ProviderError::invalid_response("garbled"))),
        );
        let chain = FallbackChain::new(LocalProvider::new())
            .with_provider(spec(ProviderKind::OpenAi, 0), openai.clone())
            .with_provider(spec(ProviderKind::Gemini, 1), gemini.clone());

        let options = ChainOptions::pinned(ProviderKind::Gemini).with_fallback(false);
        let result = chain.analyze(&image(), &options).await;

        assert!(result.degraded);
        assert_eq!(openai.calls(), 0);
        assert_eq!(gemini.calls(), 1);
        assert_eq!(
            result.failed_attempts[0].error_class,
            ErrorClass::InvalidResponse
        );
    }

    #[tokio::test]
    async fn test_unconfigured_pin_is_recorded() {
        let openai = ScriptedProvider::new(ProviderKind::OpenAi, caption("a quiet street"));
        let chain = FallbackChain::new(LocalProvider::new())
            .with_provider(spec(ProviderKind::OpenAi, 0), openai);

        let result = chain
            .analyze(&image(), &ChainOptions::pinned(ProviderKind::HuggingFace))
            .await;

        assert_eq!(result.basic_description, "a quiet street");
        assert_eq!(result.failed_attempts.len(), 1);
        assert_eq!(
            result.failed_attempts[0].error_class,
            ErrorClass::NotConfigured
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_provider_times_out() {
        let mut slow = spec(ProviderKind::OpenAi, 0);
        slow.transport = slow.transport.with_timeout(Duration::from_secs(1));
        let gemini = ScriptedProvider::new(ProviderKind::Gemini, caption("a lake at dawn"));
        let chain = FallbackChain::new(LocalProvider::new())
            .with_provider(slow, Arc::new(SlowProvider))
            .with_provider(spec(ProviderKind::Gemini, 1), gemini);

        let result = chain.analyze(&image(), &ChainOptions::default()).await;

        assert_eq!(result.basic_description, "a lake at dawn");
        assert_eq!(result.failed_attempts[0].error_class, ErrorClass::Timeout);
        assert_eq!(result.failed_attempts[0].attempts, 3);
    }

    #[tokio::test]
    async fn test_failed_attempts_never_carry_api_keys() {
        let transport = TransportConfig::new("http://127.0.0.1:9", "gemini-1.5-flash")
            .with_api_key("SECRET-KEY-123")
            .with_timeout(Duration::from_secs(5));
        let chain = FallbackChain::from_specs(
            [ProviderSpec::new(ProviderKind::Gemini, 0, transport).with_retry(RetryPolicy::no_retry())],
            LocalProvider::new(),
        )
        .unwrap();

        let result = chain.analyze(&image(), &ChainOptions::default()).await;

        assert!(result.degraded);
        assert_eq!(result.failed_attempts.len(), 1);
        assert!(!result.failed_attempts[0].message.contains("SECRET-KEY-123"));
        let json = serde_json::to_string(&result).unwrap();
        assert!(!json.contains("SECRET-KEY-123"));
    }
}
