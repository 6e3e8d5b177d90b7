//! Analysis provider configuration.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Available analysis backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// OpenAI chat-completions vision model
    #[serde(rename = "openai")]
    OpenAi,
    /// Google Gemini generateContent vision model
    Gemini,
    /// Hugging Face Inference API captioning model
    #[serde(rename = "huggingface")]
    HuggingFace,
    /// Guaranteed on-device captioner
    Local,
}

impl ProviderKind {
    /// Remote providers in their default priority order.
    pub const REMOTE: &'static [ProviderKind] = &[
        ProviderKind::OpenAi,
        ProviderKind::Gemini,
        ProviderKind::HuggingFace,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "openai",
            ProviderKind::Gemini => "gemini",
            ProviderKind::HuggingFace => "huggingface",
            ProviderKind::Local => "local",
        }
    }

    /// Whether this provider needs network access.
    pub fn is_remote(&self) -> bool {
        !matches!(self, ProviderKind::Local)
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = ProviderParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Ok(ProviderKind::OpenAi),
            "gemini" | "google" => Ok(ProviderKind::Gemini),
            "huggingface" | "hf" => Ok(ProviderKind::HuggingFace),
            "local" | "blip" => Ok(ProviderKind::Local),
            _ => Err(ProviderParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Error)]
#[error("Unknown provider: {0}")]
pub struct ProviderParseError(String);

/// Classification of provider failures, used for retry decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ErrorClass {
    /// Backend model is still loading (warming up)
    ModelLoading,
    /// Too many requests
    RateLimited,
    /// Call exceeded its timeout
    Timeout,
    /// Connection-level failure
    Network,
    /// Unexpected 5xx
    Server,
    /// Bad or missing credential
    InvalidCredential,
    /// Request rejected as malformed or unsupported
    BadRequest,
    /// Response could not be understood
    InvalidResponse,
    /// Provider has no credential configured
    NotConfigured,
}

impl ErrorClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorClass::ModelLoading => "model_loading",
            ErrorClass::RateLimited => "rate_limited",
            ErrorClass::Timeout => "timeout",
            ErrorClass::Network => "network",
            ErrorClass::Server => "server",
            ErrorClass::InvalidCredential => "invalid_credential",
            ErrorClass::BadRequest => "bad_request",
            ErrorClass::InvalidResponse => "invalid_response",
            ErrorClass::NotConfigured => "not_configured",
        }
    }
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Retry behaviour for a single provider.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total calls allowed, including the first one.
    pub max_attempts: u32,
    /// Base delay for exponential backoff (doubles each retry).
    pub base_delay: Duration,
    /// Maximum delay between retries.
    pub max_delay: Duration,
    /// Failure classes worth retrying.
    pub retryable: Vec<ErrorClass>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
            retryable: vec![
                ErrorClass::ModelLoading,
                ErrorClass::RateLimited,
                ErrorClass::Timeout,
            ],
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Default::default()
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    pub fn is_retryable(&self, class: ErrorClass) -> bool {
        self.retryable.contains(&class)
    }

    /// Delay before retry number `retry` (1 for the first retry).
    ///
    /// A backend-supplied hint replaces the computed backoff but is still
    /// capped at `max_delay`.
    pub fn delay_for_retry(&self, retry: u32, hint: Option<Duration>) -> Duration {
        if let Some(hint) = hint {
            return hint.min(self.max_delay);
        }
        let exp = 2u32.saturating_pow(retry.saturating_sub(1));
        self.base_delay.saturating_mul(exp).min(self.max_delay)
    }
}

/// Transport settings for a provider. Opaque to the fallback chain.
#[derive(Clone, PartialEq)]
pub struct TransportConfig {
    /// Base URL of the backend
    pub endpoint: String,
    /// API key, if the backend requires one
    pub api_key: Option<String>,
    /// Model name sent to the backend
    pub model: String,
    /// Per-call timeout
    pub timeout: Duration,
}

impl TransportConfig {
    pub fn new(endpoint: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key: None,
            model: model.into(),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Endpoint without a trailing slash.
    pub fn base_url(&self) -> &str {
        self.endpoint.trim_end_matches('/')
    }
}

// API keys never reach the logs.
impl fmt::Debug for TransportConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportConfig")
            .field("endpoint", &self.endpoint)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Configuration of one provider in the fallback chain.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderSpec {
    pub kind: ProviderKind,
    /// Lower ranks are tried first
    pub priority: u32,
    pub transport: TransportConfig,
    pub retry: RetryPolicy,
}

impl ProviderSpec {
    pub fn new(kind: ProviderKind, priority: u32, transport: TransportConfig) -> Self {
        Self {
            kind,
            priority,
            transport,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Identifier recorded as `provider_used`, e.g. `gemini:gemini-1.5-flash`.
    pub fn identifier(&self) -> String {
        if self.transport.model.is_empty() {
            self.kind.to_string()
        } else {
            format!("{}:{}", self.kind, self.transport.model)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_kind_parsing() {
        assert_eq!("openai".parse::<ProviderKind>().unwrap(), ProviderKind::OpenAi);
        assert_eq!("Google".parse::<ProviderKind>().unwrap(), ProviderKind::Gemini);
        assert_eq!(" hf ".parse::<ProviderKind>().unwrap(), ProviderKind::HuggingFace);
        assert_eq!("blip".parse::<ProviderKind>().unwrap(), ProviderKind::Local);
        assert!("claude".parse::<ProviderKind>().is_err());
    }

    #[test]
    fn test_provider_kind_serde_names() {
        let json = serde_json::to_string(&ProviderKind::HuggingFace).unwrap();
        assert_eq!(json, "\"huggingface\"");
        let kind: ProviderKind = serde_json::from_str("\"openai\"").unwrap();
        assert_eq!(kind, ProviderKind::OpenAi);
    }

    #[test]
    fn test_retry_policy_backoff() {
        let policy = RetryPolicy::default()
            .with_base_delay(Duration::from_millis(100))
            .with_max_delay(Duration::from_millis(500));

        assert_eq!(policy.delay_for_retry(1, None), Duration::from_millis(100));
        assert_eq!(policy.delay_for_retry(2, None), Duration::from_millis(200));
        assert_eq!(policy.delay_for_retry(3, None), Duration::from_millis(400));
        assert_eq!(policy.delay_for_retry(4, None), Duration::from_millis(500));
        assert_eq!(
            policy.delay_for_retry(1, Some(Duration::from_secs(20))),
            Duration::from_millis(500)
        );
    }

    #[test]
    fn test_retry_policy_classes() {
        let policy = RetryPolicy::default();
        assert!(policy.is_retryable(ErrorClass::ModelLoading));
        assert!(policy.is_retryable(ErrorClass::RateLimited));
        assert!(!policy.is_retryable(ErrorClass::InvalidCredential));
        assert!(!policy.is_retryable(ErrorClass::BadRequest));
        assert_eq!(RetryPolicy::no_retry().max_attempts, 1);
        assert_eq!(RetryPolicy::default().with_max_attempts(0).max_attempts, 1);
    }

    #[test]
    fn test_transport_debug_redacts_key() {
        let transport = TransportConfig::new("https://api.example.com/", "model-x")
            .with_api_key("sk-secret");
        let debug = format!("{:?}", transport);
        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("<redacted>"));
        assert_eq!(transport.base_url(), "https://api.example.com");
    }

    #[test]
    fn test_spec_identifier() {
        let spec = ProviderSpec::new(
            ProviderKind::Gemini,
            1,
            TransportConfig::new("https://example.com", "gemini-1.5-flash"),
        );
        assert_eq!(spec.identifier(), "gemini:gemini-1.5-flash");
    }
}
