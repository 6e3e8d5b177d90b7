//! Pipeline configuration.

use std::str::FromStr;
use std::time::Duration;

use shotplan_models::{OutputFormat, ProviderKind, ProviderSpec, RetryPolicy, TransportConfig};
use shotplan_planner::{ContextConfig, PlannerConfig, RenderConfig};
use shotplan_vision::{gemini, huggingface, openai, ChainOptions};
use tracing::{debug, warn};

const DEFAULT_PROVIDERS: &str = "openai,gemini,huggingface";

/// Pipeline configuration.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Remote providers, in priority order
    pub providers: Vec<ProviderSpec>,
    pub chain: ChainOptions,
    pub planner: PlannerConfig,
    pub context: ContextConfig,
    pub render: RenderConfig,
    /// Duration used when a request does not give one
    pub default_duration_secs: u32,
    pub default_format: OutputFormat,
    /// Seed applied to every request that does not carry its own
    pub seed: Option<u64>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            providers: Vec::new(),
            chain: ChainOptions::default(),
            planner: PlannerConfig::default(),
            context: ContextConfig::default(),
            render: RenderConfig::default(),
            default_duration_secs: 30,
            default_format: OutputFormat::Both,
            seed: None,
        }
    }
}

impl PipelineConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create config from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(lookup);
        let defaults = Self::default();
        let planner_defaults = PlannerConfig::default();

        let timeout = Duration::from_secs(env.parse("SHOTPLAN_PROVIDER_TIMEOUT_SECS").unwrap_or(30));
        let retry = RetryPolicy::default()
            .with_max_attempts(env.parse("SHOTPLAN_MAX_ATTEMPTS").unwrap_or(3))
            .with_base_delay(Duration::from_millis(
                env.parse("SHOTPLAN_RETRY_BASE_MS").unwrap_or(500),
            ))
            .with_max_delay(Duration::from_millis(
                env.parse("SHOTPLAN_RETRY_MAX_MS").unwrap_or(8000),
            ));

        let order = env
            .string("SHOTPLAN_PROVIDERS")
            .unwrap_or_else(|| DEFAULT_PROVIDERS.to_string());
        let providers = provider_order(&order)
            .into_iter()
            .filter_map(|kind| transport_for(&env, kind).map(|t| (kind, t)))
            .enumerate()
            .map(|(priority, (kind, transport))| {
                ProviderSpec::new(kind, priority as u32, transport.with_timeout(timeout))
                    .with_retry(retry.clone())
            })
            .collect();

        let pinned = env.string("SHOTPLAN_PROVIDER").and_then(|s| match s.parse() {
            Ok(kind) => Some(kind),
            Err(e) => {
                warn!("Ignoring SHOTPLAN_PROVIDER: {}", e);
                None
            }
        });
        let chain = ChainOptions {
            pinned,
            fallback_enabled: env
                .string("SHOTPLAN_FALLBACK_ENABLED")
                .and_then(|s| parse_flag(&s))
                .unwrap_or(true),
        };

        let planner = PlannerConfig {
            min_duration_secs: env
                .parse("SHOTPLAN_MIN_DURATION")
                .unwrap_or(planner_defaults.min_duration_secs),
            max_duration_secs: env
                .parse("SHOTPLAN_MAX_DURATION")
                .unwrap_or(planner_defaults.max_duration_secs),
            min_segment_secs: env
                .parse("SHOTPLAN_MIN_SEGMENT_SECS")
                .unwrap_or(planner_defaults.min_segment_secs),
            max_segment_secs: env
                .parse("SHOTPLAN_MAX_SEGMENT_SECS")
                .unwrap_or(planner_defaults.max_segment_secs),
            ..planner_defaults
        };

        Self {
            providers,
            chain,
            planner,
            default_duration_secs: env
                .parse("SHOTPLAN_DEFAULT_DURATION")
                .unwrap_or(defaults.default_duration_secs),
            default_format: env
                .parse("SHOTPLAN_OUTPUT_FORMAT")
                .unwrap_or(defaults.default_format),
            seed: env.parse("SHOTPLAN_SEED"),
            ..defaults
        }
    }
}

struct Env<F>(F);

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    /// Trimmed, non-empty value.
    fn string(&self, key: &str) -> Option<String> {
        (self.0)(key)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }

    fn parse<T: FromStr>(&self, key: &str) -> Option<T> {
        self.string(key).and_then(|s| s.parse().ok())
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Remote provider kinds named in a comma list, first mention wins.
fn provider_order(list: &str) -> Vec<ProviderKind> {
    let mut kinds = Vec::new();
    for name in list.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        match name.parse::<ProviderKind>() {
            Ok(kind) if !kind.is_remote() => {}
            Ok(kind) if kinds.contains(&kind) => {}
            Ok(kind) => kinds.push(kind),
            Err(e) => warn!("Ignoring provider in SHOTPLAN_PROVIDERS: {}", e),
        }
    }
    kinds
}

/// Transport for a remote `kind`. A missing API key is kept as `None`; the
/// adapter then reports the provider as not configured without a network call.
fn transport_for<F>(env: &Env<F>, kind: ProviderKind) -> Option<TransportConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let (key, base_url, model) = match kind {
        ProviderKind::OpenAi => (
            env.string("OPENAI_API_KEY"),
            env.string("OPENAI_BASE_URL")
                .unwrap_or_else(|| openai::DEFAULT_BASE_URL.to_string()),
            env.string("OPENAI_MODEL")
                .unwrap_or_else(|| openai::DEFAULT_MODEL.to_string()),
        ),
        ProviderKind::Gemini => (
            env.string("GEMINI_API_KEY")
                .or_else(|| env.string("GOOGLE_API_KEY")),
            env.string("GEMINI_BASE_URL")
                .unwrap_or_else(|| gemini::DEFAULT_BASE_URL.to_string()),
            env.string("GEMINI_MODEL")
                .unwrap_or_else(|| gemini::DEFAULT_MODEL.to_string()),
        ),
        ProviderKind::HuggingFace => (
            env.string("HUGGINGFACE_API_KEY"),
            env.string("HUGGINGFACE_BASE_URL")
                .unwrap_or_else(|| huggingface::DEFAULT_BASE_URL.to_string()),
            env.string("HUGGINGFACE_MODEL")
                .unwrap_or_else(|| huggingface::DEFAULT_MODEL.to_string()),
        ),
        ProviderKind::Local => return None,
    };

    let transport = TransportConfig::new(base_url, model);
    Some(match key {
        Some(key) => transport.with_api_key(key),
        None => {
            debug!(provider = %kind, "No API key configured");
            transport
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> PipelineConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        PipelineConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults_without_environment() {
        let config = config(&[]);
        let kinds: Vec<ProviderKind> = config.providers.iter().map(|s| s.kind).collect();
        assert_eq!(kinds, ProviderKind::REMOTE);
        assert!(config.providers.iter().all(|s| s.transport.api_key.is_none()));
        assert_eq!(config.chain, ChainOptions::default());
        assert_eq!(config.planner, PlannerConfig::default());
        assert_eq!(config.default_duration_secs, 30);
        assert_eq!(config.default_format, OutputFormat::Both);
        assert_eq!(config.seed, None);
    }

    #[test]
    fn test_listed_providers_in_order() {
        let config = config(&[
            ("SHOTPLAN_PROVIDERS", "huggingface, local, openai, bogus, huggingface"),
            ("OPENAI_API_KEY", "sk-test"),
            ("GEMINI_API_KEY", "g-test"),
        ]);
        let kinds: Vec<ProviderKind> = config.providers.iter().map(|s| s.kind).collect();
        assert_eq!(kinds, vec![ProviderKind::HuggingFace, ProviderKind::OpenAi]);
        assert_eq!(config.providers[0].priority, 0);
        assert_eq!(config.providers[1].priority, 1);
        assert!(config.providers[0].transport.api_key.is_none());
        assert_eq!(config.providers[1].transport.api_key.as_deref(), Some("sk-test"));
    }

    #[test]
    fn test_gemini_accepts_google_key_and_overrides() {
        let config = config(&[
            ("GOOGLE_API_KEY", "g-test"),
            ("GEMINI_BASE_URL", "http://localhost:9000"),
            ("GEMINI_MODEL", "gemini-test"),
            ("SHOTPLAN_PROVIDER_TIMEOUT_SECS", "5"),
            ("SHOTPLAN_MAX_ATTEMPTS", "2"),
        ]);
        let spec = config
            .providers
            .iter()
            .find(|s| s.kind == ProviderKind::Gemini)
            .unwrap();
        assert_eq!(spec.transport.endpoint, "http://localhost:9000");
        assert_eq!(spec.transport.model, "gemini-test");
        assert_eq!(spec.transport.api_key.as_deref(), Some("g-test"));
        assert_eq!(spec.transport.timeout, Duration::from_secs(5));
        assert_eq!(spec.retry.max_attempts, 2);
    }

    #[test]
    fn test_chain_and_planner_settings() {
        let config = config(&[
            ("SHOTPLAN_PROVIDER", "gemini"),
            ("SHOTPLAN_FALLBACK_ENABLED", "false"),
            ("SHOTPLAN_MIN_DURATION", "3"),
            ("SHOTPLAN_MAX_SEGMENT_SECS", "6"),
            ("SHOTPLAN_SEED", "42"),
            ("SHOTPLAN_OUTPUT_FORMAT", "narrative"),
            ("SHOTPLAN_DEFAULT_DURATION", "12"),
        ]);
        assert_eq!(config.chain.pinned, Some(ProviderKind::Gemini));
        assert!(!config.chain.fallback_enabled);
        assert_eq!(config.planner.min_duration_secs, 3);
        assert_eq!(config.planner.max_segment_secs, 6);
        assert_eq!(config.planner.max_duration_secs, 120);
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.default_format, OutputFormat::Narrative);
        assert_eq!(config.default_duration_secs, 12);
    }

    #[test]
    fn test_unparseable_values_fall_back_to_defaults() {
        let config = config(&[
            ("SHOTPLAN_PROVIDER", "carrier-pigeon"),
            ("SHOTPLAN_FALLBACK_ENABLED", "maybe"),
            ("SHOTPLAN_MAX_DURATION", "two minutes"),
            ("SHOTPLAN_SEED", ""),
        ]);
        assert_eq!(config.chain, ChainOptions::default());
        assert_eq!(config.planner.max_duration_secs, 120);
        assert_eq!(config.seed, None);
    }
}
