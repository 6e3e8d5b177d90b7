//! Provider metrics.
//!
//! Counters and latency for every provider call:
//! - Attempts by provider and outcome
//! - Retries by provider
//! - Local fallbacks by reason
//!
//! Installing a recorder is left to the embedding application.

use metrics::{counter, histogram};
use shotplan_models::ProviderKind;

// =============================================================================
// Metric Names
// =============================================================================

/// Metric name constants for consistency.
pub mod names {
    /// Provider calls by provider and outcome (success or error class).
    pub const PROVIDER_ATTEMPTS_TOTAL: &str = "shotplan_provider_attempts_total";

    /// Retries by provider.
    pub const PROVIDER_RETRIES_TOTAL: &str = "shotplan_provider_retries_total";

    /// Times the local provider had to answer, by reason.
    pub const LOCAL_FALLBACKS_TOTAL: &str = "shotplan_local_fallbacks_total";

    /// Provider call latency in seconds.
    pub const PROVIDER_LATENCY_SECONDS: &str = "shotplan_provider_latency_seconds";
}

// =============================================================================
// Recording Functions
// =============================================================================

/// Record one provider call.
pub fn record_attempt(provider: ProviderKind, outcome: &str, latency_ms: f64) {
    counter!(
        names::PROVIDER_ATTEMPTS_TOTAL,
        "provider" => provider.as_str(),
        "outcome" => outcome.to_string()
    )
    .increment(1);

    histogram!(
        names::PROVIDER_LATENCY_SECONDS,
        "provider" => provider.as_str()
    )
    .record(latency_ms / 1000.0);
}

/// Record a retry.
pub fn record_retry(provider: ProviderKind) {
    counter!(
        names::PROVIDER_RETRIES_TOTAL,
        "provider" => provider.as_str()
    )
    .increment(1);
}

/// Record the local provider answering.
pub fn record_local_fallback(reason: &'static str) {
    counter!(names::LOCAL_FALLBACKS_TOTAL, "reason" => reason).increment(1);
}

// =============================================================================
// Tests
// =============================================================================
