//! Shared HTTP plumbing for the remote adapters.

use std::time::Duration;

use reqwest::header::RETRY_AFTER;
use reqwest::{Client, Response, StatusCode};

use crate::error::{ProviderError, ProviderResult};

/// Longest error body kept in messages.
const MAX_ERROR_BODY: usize = 300;

/// Build the HTTP client used by one adapter.
pub fn build_client(timeout: Duration) -> ProviderResult<Client> {
    Ok(Client::builder()
        .timeout(timeout)
        .user_agent(concat!("shotplan/", env!("CARGO_PKG_VERSION")))
        .build()?)
}

/// Return the response if it succeeded, otherwise classify the failure.
pub async fn check_status(response: Response) -> ProviderResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let header_hint = response
        .headers()
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<f64>().ok())
        .and_then(seconds);
    let body = response.text().await.unwrap_or_default();
    let hint = header_hint.or_else(|| estimated_time(&body));

    Err(classify_status(status, body, hint))
}

/// Map an HTTP failure status to a provider error.
pub fn classify_status(status: StatusCode, body: String, hint: Option<Duration>) -> ProviderError {
    let body = truncate(body);
    match status.as_u16() {
        401 | 403 => ProviderError::InvalidCredential(format!("{}: {}", status, body)),
        400 | 404 | 413 | 415 | 422 => ProviderError::BadRequest {
            status: status.as_u16(),
            body,
        },
        429 => ProviderError::RateLimited { retry_after: hint },
        503 => ProviderError::ModelLoading { retry_after: hint },
        code => ProviderError::Server { status: code, body },
    }
}

/// The `estimated_time` field Hugging Face puts in "currently loading" bodies.
fn estimated_time(body: &str) -> Option<Duration> {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()?
        .get("estimated_time")?
        .as_f64()
        .and_then(seconds)
}

fn seconds(secs: f64) -> Option<Duration> {
    (secs.is_finite() && secs >= 0.0).then(|| Duration::from_secs_f64(secs))
}

fn truncate(mut body: String) -> String {
    if body.len() > MAX_ERROR_BODY {
        let mut cut = MAX_ERROR_BODY;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        body.truncate(cut);
        body.push_str("...");
    }
    body
}
