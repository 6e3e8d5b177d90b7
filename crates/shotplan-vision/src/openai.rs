//! OpenAI chat-completions vision adapter.

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

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
const MAX_TOKENS: u32 = 500;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: Vec<MessagePart<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum MessagePart<'a> {
    Text { text: &'a str },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

/// Vision analysis through `/v1/chat/completions`.
pub struct OpenAiVisionProvider {
    transport: TransportConfig,
    client: Client,
}

impl OpenAiVisionProvider {
    pub fn new(transport: TransportConfig) -> ProviderResult<Self> {
        let client = build_client(transport.timeout)?;
        Ok(Self { transport, client })
    }

    fn url(&self) -> String {
        format!("{}/v1/chat/completions", self.transport.base_url())
    }
}

#[async_trait]
impl AnalysisProvider for OpenAiVisionProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::OpenAi
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
            .ok_or_else(|| ProviderError::not_configured("OPENAI_API_KEY not set"))?;

        let request = ChatRequest {
            model: &self.transport.model,
            messages: vec![ChatMessage {
                role: "user",
                content: vec![
                    MessagePart::Text {
                        text: ANALYSIS_PROMPT,
                    },
                    MessagePart::ImageUrl {
                        image_url: ImageUrl {
                            url: image.data_uri(),
                        },
                    },
                ],
            }],
            max_tokens: MAX_TOKENS,
            response_format: ResponseFormat {
                kind: "json_object",
            },
        };

        debug!(model = %self.transport.model, attempt = call.attempt, "Calling OpenAI vision");

        let response = self
            .client
            .post(self.url())
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?;
        let response: ChatResponse = check_status(response).await?.json().await?;

        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| ProviderError::invalid_response("No content in OpenAI response"))?;

        parse_report(&content)
    }
}
