//! Gemini `generateContent` vision adapter.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use shotplan_models::{ProviderKind, TransportConfig};
use tracing::debug;

use crate::error::{ProviderError, ProviderResult};
use crate::http::{build_client, check_status};
use crate::image::ImagePayload;
use crate::provider::{AnalysisProvider, CallContext, RawAnalysis};
use crate::report::{parse_report, ANALYSIS_PROMPT};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";
/// Keeps the key out of the request URL, and so out of error messages.
pub const API_KEY_HEADER: &str = "x-goog-api-key";

/// Gemini API request.
#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part {
    Text { text: String },
    Inline { inline_data: InlineData },
}

#[derive(Debug, Serialize)]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    #[serde(rename = "responseMimeType")]
    response_mime_type: String,
}

/// Gemini API response.
#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<ResponseContent>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

/// Vision analysis through Gemini.
pub struct GeminiVisionProvider {
    transport: TransportConfig,
    client: Client,
}

impl GeminiVisionProvider {
    pub fn new(transport: TransportConfig) -> ProviderResult<Self> {
        let client = build_client(transport.timeout)?;
        Ok(Self { transport, client })
    }

    fn url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.transport.base_url(),
            self.transport.model
        )
    }
}

#[async_trait]
impl AnalysisProvider for GeminiVisionProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Gemini
    }

    async fn analyze(
        &self,
        image: &ImagePayload,
        call: CallContext,
    ) -> ProviderResult<RawAnalysis> {
        let api_key = self
            .transport
            .api_key
            .as_deref()
            .ok_or_else(|| ProviderError::not_configured("GEMINI_API_KEY not set"))?;

        let request = GeminiRequest {
            contents: vec![Content {
                parts: vec![
                    Part::Text {
                        text: ANALYSIS_PROMPT.to_string(),
                    },
                    Part::Inline {
                        inline_data: InlineData {
                            mime_type: image.mime_type().to_string(),
                            data: image.to_base64(),
                        },
                    },
                ],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json".to_string(),
            },
        };

        debug!(model = %self.transport.model, attempt = call.attempt, "Calling Gemini vision");

        let response = self
            .client
            .post(self.url())
            .header(API_KEY_HEADER, api_key)
            .json(&request)
            .send()
            .await?;
        let response: GeminiResponse = check_status(response).await?.json().await?;

        let text: String = response
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();
        if text.trim().is_empty() {
            return Err(ProviderError::invalid_response(
                "No content in Gemini response",
            ));
        }

        parse_report(&text)
    }
}
