//! Hugging Face Inference API captioning adapter (BLIP).

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use serde::Deserialize;
use shotplan_models::{ProviderKind, TransportConfig};
use tracing::debug;

use crate::error::{ProviderError, ProviderResult};
use crate::http::{build_client, check_status};
use crate::image::ImagePayload;
use crate::provider::{AnalysisProvider, CallContext, RawAnalysis};

pub const DEFAULT_BASE_URL: &str = "https://api-inference.huggingface.co";
pub const DEFAULT_MODEL: &str = "Salesforce/blip-image-captioning-base";

/// Header asking the Inference API to block until the model is loaded.
pub const WAIT_FOR_MODEL_HEADER: &str = "x-wait-for-model";

/// The Inference API answers either with a list or a single object.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CaptionResponse {
    Many(Vec<Caption>),
    One(Caption),
}

#[derive(Debug, Deserialize)]
struct Caption {
    #[serde(default)]
    generated_text: Option<String>,
}

impl CaptionResponse {
    fn into_text(self) -> Option<String> {
        let caption = match self {
            CaptionResponse::Many(list) => list.into_iter().next()?,
            CaptionResponse::One(caption) => caption,
        };
        caption
            .generated_text
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
    }
}

/// Image captioning through the Inference API.
pub struct HuggingFaceCaptionProvider {
    transport: TransportConfig,
    client: Client,
}

impl HuggingFaceCaptionProvider {
    pub fn new(transport: TransportConfig) -> ProviderResult<Self> {
        let client = build_client(transport.timeout)?;
        Ok(Self { transport, client })
    }

    fn url(&self) -> String {
        format!("{}/models/{}", self.transport.base_url(), self.transport.model)
    }
}

#[async_trait]
impl AnalysisProvider for HuggingFaceCaptionProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::HuggingFace
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
            .ok_or_else(|| ProviderError::not_configured("HUGGINGFACE_API_KEY not set"))?;

        debug!(
            model = %self.transport.model,
            attempt = call.attempt,
            wait_for_model = call.wait_for_model,
            "Calling Hugging Face captioning"
        );

        let mut request = self
            .client
            .post(self.url())
            .bearer_auth(api_key)
            .header(CONTENT_TYPE, "application/octet-stream")
            .body(image.bytes().to_vec());
        if call.wait_for_model {
            request = request.header(WAIT_FOR_MODEL_HEADER, "true");
        }

        let response = check_status(request.send().await?).await?;
        let caption: CaptionResponse = response.json().await?;
        let text = caption
            .into_text()
            .ok_or_else(|| ProviderError::invalid_response("No generated_text in caption"))?;

        Ok(RawAnalysis::from_description(text))
    }
}
