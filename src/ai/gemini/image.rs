use super::client::GeminiHttpClient;
use super::types::{Content, GenerateContentResponse, InlineData, Part};
use crate::ai::mime::{resolve_image_mime, to_data_uri};
use crate::ai::ImageGenerationService;
use crate::models::AspectRatio;
use crate::{Error, Result};
use async_trait::async_trait;
use base64::Engine as _;
use serde::Serialize;

#[derive(Debug, Serialize)]
struct ImageRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: ImageGenerationConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ImageGenerationConfig {
    response_modalities: Vec<String>,
    image_config: ImageConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ImageConfig {
    aspect_ratio: String,
}

pub struct GeminiImageClient {
    http: GeminiHttpClient,
}

impl GeminiImageClient {
    pub fn new(api_key: Option<String>, model: String) -> Self {
        Self::new_with_client(api_key, model, reqwest::Client::new())
    }

    pub fn new_with_client(
        api_key: Option<String>,
        model: String,
        client: reqwest::Client,
    ) -> Self {
        Self {
            http: GeminiHttpClient::new_with_client(api_key, model, client),
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.http = self.http.with_base_url(base_url);
        self
    }

    pub fn model(&self) -> &str {
        self.http.model()
    }
}

/// Pull the first inline image out of the first candidate.
fn extract_inline_image(response: GenerateContentResponse) -> Result<InlineData> {
    if let Some(reason) = response
        .prompt_feedback
        .as_ref()
        .and_then(|f| f.block_reason.as_deref())
    {
        tracing::warn!("Gemini blocked the prompt: {}", reason);
    }

    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or(Error::EmptyResult)?;

    if let Some(reason) = candidate.finish_reason.as_deref() {
        tracing::debug!("Gemini candidate finish reason: {}", reason);
    }

    let parts = candidate
        .content
        .map(|content| content.parts)
        .filter(|parts| !parts.is_empty())
        .ok_or(Error::EmptyResult)?;

    parts
        .into_iter()
        .find_map(|p| match p {
            Part::InlineData { inline_data } => Some(inline_data),
            _ => None,
        })
        .ok_or(Error::NoImageData)
}

#[async_trait]
impl ImageGenerationService for GeminiImageClient {
    async fn generate_image(&self, prompt: &str, aspect_ratio: AspectRatio) -> Result<String> {
        let request = ImageRequest {
            contents: vec![Content {
                role: None,
                parts: vec![Part::Text {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: ImageGenerationConfig {
                response_modalities: vec!["IMAGE".to_string()],
                image_config: ImageConfig {
                    aspect_ratio: aspect_ratio.as_str().to_string(),
                },
            },
        };

        tracing::debug!(
            "Requesting {} image from {} ({} chars)",
            aspect_ratio,
            self.http.model(),
            prompt.len()
        );

        let gemini_response: GenerateContentResponse = self.http.generate_content(&request).await?;
        let image_data = extract_inline_image(gemini_response)?;

        tracing::debug!(
            "Gemini returned image with mime_type: {:?}",
            image_data.mime_type
        );

        let bytes = base64::engine::general_purpose::STANDARD
            .decode(image_data.data.trim())
            .map_err(|e| Error::Decode(format!("Gemini returned invalid base64 image: {}", e)))?;

        let mime = resolve_image_mime(image_data.mime_type.as_deref(), &bytes);
        Ok(to_data_uri(mime, &bytes))
    }
}
