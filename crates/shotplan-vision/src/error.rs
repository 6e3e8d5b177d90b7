//! Vision error types.

use std::time::Duration;

use shotplan_models::ErrorClass;
use thiserror::Error;

pub type ProviderResult<T> = Result<T, ProviderError>;
pub type ImageResult<T> = Result<T, ImageError>;

/// Failure of a single provider call.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Model is still loading")]
    ModelLoading { retry_after: Option<Duration> },

    #[error("Rate limited")]
    RateLimited { retry_after: Option<Duration> },

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("Network error: {0}")]
    Network(#[source] reqwest::Error),

    #[error("Server error {status}: {body}")]
    Server { status: u16, body: String },

    #[error("Invalid credential: {0}")]
    InvalidCredential(String),

    #[error("Request rejected ({status}): {body}")]
    BadRequest { status: u16, body: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

// Request URLs can carry credentials; they never reach logs or results.
impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        Self::Network(e.without_url())
    }
}

impl ProviderError {
    pub fn not_configured(msg: impl Into<String>) -> Self {
        Self::NotConfigured(msg.into())
    }

    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }

    /// Classify the failure for retry decisions.
    pub fn class(&self) -> ErrorClass {
        match self {
            ProviderError::NotConfigured(_) => ErrorClass::NotConfigured,
            ProviderError::ModelLoading { .. } => ErrorClass::ModelLoading,
            ProviderError::RateLimited { .. } => ErrorClass::RateLimited,
            ProviderError::Timeout(_) => ErrorClass::Timeout,
            ProviderError::Network(e) if e.is_timeout() => ErrorClass::Timeout,
            ProviderError::Network(e) if e.is_decode() => ErrorClass::InvalidResponse,
            ProviderError::Network(_) => ErrorClass::Network,
            ProviderError::Server { .. } => ErrorClass::Server,
            ProviderError::InvalidCredential(_) => ErrorClass::InvalidCredential,
            ProviderError::BadRequest { .. } => ErrorClass::BadRequest,
            ProviderError::InvalidResponse(_) | ProviderError::Json(_) => {
                ErrorClass::InvalidResponse
            }
        }
    }

    /// Wait hint supplied by the backend, if any.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            ProviderError::ModelLoading { retry_after }
            | ProviderError::RateLimited { retry_after } => *retry_after,
            _ => None,
        }
    }
}

/// The image could not be accepted as input.
#[derive(Debug, Error)]
pub enum ImageError {
    #[error("Image is empty")]
    Empty,

    #[error("Unrecognized image format")]
    UnknownFormat,

    #[error("Unsupported image format: {0}")]
    UnsupportedFormat(String),

    #[error("Unreadable image: {0}")]
    Unreadable(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classes() {
        assert_eq!(
            ProviderError::ModelLoading { retry_after: None }.class(),
            ErrorClass::ModelLoading
        );
        assert_eq!(
            ProviderError::InvalidCredential("bad key".into()).class(),
            ErrorClass::InvalidCredential
        );
        assert_eq!(
            ProviderError::BadRequest { status: 400, body: String::new() }.class(),
            ErrorClass::BadRequest
        );
        assert_eq!(
            ProviderError::invalid_response("empty").class(),
            ErrorClass::InvalidResponse
        );
    }

    #[test]
    fn test_retry_after_hint() {
        let err = ProviderError::RateLimited {
            retry_after: Some(Duration::from_secs(2)),
        };
        assert_eq!(err.retry_after(), Some(Duration::from_secs(2)));
        assert_eq!(ProviderError::Timeout(Duration::from_secs(1)).retry_after(), None);
    }
}
