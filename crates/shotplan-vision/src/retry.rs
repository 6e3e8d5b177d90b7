//! Retry with exponential backoff for provider calls.
//!
//! Only failures whose class the policy lists as retryable are retried;
//! everything else returns immediately so the chain can fall through.

use std::future::Future;
use std::time::Instant;

use shotplan_models::{ProviderKind, RetryPolicy};
use tracing::{debug, warn};

use crate::error::ProviderError;
use crate::metrics;
use crate::provider::CallContext;

/// Result of a retried provider call.
#[derive(Debug)]
pub enum RetryOutcome<T> {
    /// Call succeeded.
    Success { value: T, attempts: u32 },
    /// Call failed terminally or retries were exhausted.
    Failed { error: ProviderError, attempts: u32 },
}

impl<T> RetryOutcome<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, RetryOutcome::Success { .. })
    }

    pub fn attempts(&self) -> u32 {
        match self {
            RetryOutcome::Success { attempts, .. } | RetryOutcome::Failed { attempts, .. } => {
                *attempts
            }
        }
    }
}

/// Execute a provider call under `policy`.
///
/// The operation receives a [`CallContext`]; every retry asks the backend
/// to wait for its model.
///
/// # Example
/// ```ignore
/// let outcome = retry_with_policy(&spec.retry, ProviderKind::HuggingFace, |call| async move {
///     provider.analyze(&image, call).await
/// }).await;
/// ```
pub async fn retry_with_policy<F, Fut, T>(
    policy: &RetryPolicy,
    provider: ProviderKind,
    operation: F,
) -> RetryOutcome<T>
where
    F: Fn(CallContext) -> Fut,
    Fut: Future<Output = Result<T, ProviderError>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1u32;

    loop {
        let call = CallContext::for_attempt(attempt);
        let started = Instant::now();
        let result = operation(call).await;
        let latency_ms = started.elapsed().as_secs_f64() * 1000.0;

        match result {
            Ok(value) => {
                metrics::record_attempt(provider, "success", latency_ms);
                return RetryOutcome::Success {
                    value,
                    attempts: attempt,
                };
            }
            Err(e) => {
                let class = e.class();
                metrics::record_attempt(provider, class.as_str(), latency_ms);

                if attempt < max_attempts && policy.is_retryable(class) {
                    let delay = policy.delay_for_retry(attempt, e.retry_after());
                    warn!(
                        provider = %provider,
                        attempt,
                        max_attempts,
                        error_class = %class,
                        delay_ms = delay.as_millis() as u64,
                        "Provider call failed, retrying: {}",
                        e
                    );
                    metrics::record_retry(provider);
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                    continue;
                }

                debug!(
                    provider = %provider,
                    attempt,
                    error_class = %class,
                    "Provider call failed without retry"
                );
                return RetryOutcome::Failed {
                    error: e,
                    attempts: attempt,
                };
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::default()
            .with_max_attempts(max_attempts)
            .with_base_delay(Duration::from_millis(1))
            .with_max_delay(Duration::from_millis(5))
    }

    #[tokio::test]
    async fn test_immediate_success() {
        let calls = AtomicU32::new(0);

        let outcome = retry_with_policy(&fast_policy(3), ProviderKind::Gemini, |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok::<_, ProviderError>(42) }
        })
        .await;

        assert!(outcome.is_success());
        assert_eq!(outcome.attempts(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_transient_failures_are_retried() {
        let calls = AtomicU32::new(0);

        let outcome = retry_with_policy(&fast_policy(3), ProviderKind::HuggingFace, |_| {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(ProviderError::ModelLoading { retry_after: None })
                } else {
                    Ok("caption")
                }
            }
        })
        .await;

        match outcome {
            RetryOutcome::Success { value, attempts } => {
                assert_eq!(value, "caption");
                assert_eq!(attempts, 3);
            }
            other => panic!("expected success, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_exhaustion_reports_attempts() {
        let outcome = retry_with_policy(&fast_policy(2), ProviderKind::OpenAi, |_| async {
            Err::<(), _>(ProviderError::RateLimited { retry_after: None })
        })
        .await;

        match outcome {
            RetryOutcome::Failed { error, attempts } => {
                assert_eq!(attempts, 2);
                assert!(matches!(error, ProviderError::RateLimited { .. }));
            }
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_terminal_failure_not_retried() {
        let calls = AtomicU32::new(0);

        let outcome = retry_with_policy(&fast_policy(5), ProviderKind::OpenAi, |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err::<(), _>(ProviderError::InvalidCredential("401".into())) }
        })
        .await;

        assert!(!outcome.is_success());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_retries_request_wait_for_model() {
        let seen = Mutex::new(Vec::new());

        let _ = retry_with_policy(&fast_policy(3), ProviderKind::HuggingFace, |call| {
            seen.lock().unwrap().push(call);
            async { Err::<(), _>(ProviderError::Timeout(Duration::from_millis(1))) }
        })
        .await;

        let seen = seen.into_inner().unwrap();
        assert_eq!(seen.len(), 3);
        assert!(!seen[0].wait_for_model);
        assert!(seen[1].wait_for_model && seen[2].wait_for_model);
        assert_eq!(seen[2].attempt, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_backoff_honours_hint_capped() {
        let policy = RetryPolicy::default()
            .with_max_attempts(2)
            .with_max_delay(Duration::from_secs(2));
        let started = tokio::time::Instant::now();

        let _ = retry_with_policy(&policy, ProviderKind::HuggingFace, |_| async {
            Err::<(), _>(ProviderError::ModelLoading {
                retry_after: Some(Duration::from_secs(20)),
            })
        })
        .await;

        let waited = started.elapsed();
        assert!(waited >= Duration::from_secs(2) && waited < Duration::from_secs(3));
    }
}
