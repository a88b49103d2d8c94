//! OpenAI image generation provider (dall-e-3, gpt-image-1).

use crate::error::{CocktailError, Result};
use crate::image::provider::ImageProvider;
use crate::image::types::{GeneratedImage, GenerationMetadata, GenerationRequest, DEFAULT_QUALITY};
use crate::openai::OpenAiConnection;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

const GENERATIONS_PATH: &str = "/images/generations";

/// OpenAI image model variants.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OpenAiImageModel {
    /// DALL-E 3 - returns a transient URL.
    #[default]
    DallE3,
    /// GPT Image 1 - returns the image inline as base64.
    GptImage1,
}

impl OpenAiImageModel {
    /// Returns the API model identifier string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DallE3 => "dall-e-3",
            Self::GptImage1 => "gpt-image-1",
        }
    }
}

/// Builder for OpenAiImageProvider.
#[derive(Debug, Clone, Default)]
pub struct OpenAiImageProviderBuilder {
    api_key: Option<String>,
    base_url: Option<String>,
    model: OpenAiImageModel,
    quality: Option<String>,
    timeout: Option<Duration>,
}

impl OpenAiImageProviderBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the API key. Falls back to `OPENAI_API_KEY` env var.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the API base URL. Falls back to `OPENAI_BASE_URL`, then the public API.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Sets the OpenAI image model variant.
    pub fn model(mut self, model: OpenAiImageModel) -> Self {
        self.model = model;
        self
    }

    /// Sets the quality. For dall-e-3: "standard", "hd" (default: "standard").
    /// For gpt-image-1: "low", "medium", "high" (default: left to the API).
    pub fn quality(mut self, quality: impl Into<String>) -> Self {
        self.quality = Some(quality.into());
        self
    }

    /// Sets a whole-request timeout. Without one a call waits until the API answers.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Builds the provider. A missing API key surfaces on the first call.
    pub fn build(self) -> Result<OpenAiImageProvider> {
        Ok(OpenAiImageProvider {
            connection: OpenAiConnection::resolve(self.api_key, self.base_url, self.timeout)?,
            model: self.model,
            quality: self.quality.or_else(|| match self.model {
                OpenAiImageModel::DallE3 => Some(DEFAULT_QUALITY.to_string()),
                OpenAiImageModel::GptImage1 => None,
            }),
        })
    }
}

/// OpenAI image generation provider.
#[derive(Debug)]
pub struct OpenAiImageProvider {
    connection: OpenAiConnection,
    model: OpenAiImageModel,
    quality: Option<String>,
}

impl OpenAiImageProvider {
    /// Creates a new `OpenAiImageProviderBuilder`.
    pub fn builder() -> OpenAiImageProviderBuilder {
        OpenAiImageProviderBuilder::new()
    }

    /// Returns the configured model.
    pub fn model(&self) -> OpenAiImageModel {
        self.model
    }

    /// HTTP client, reusable for downloading the generated image.
    pub fn http_client(&self) -> &reqwest::Client {
        self.connection.client()
    }

    /// Returns true if an API key was found.
    pub fn has_api_key(&self) -> bool {
        self.connection.has_api_key()
    }
}

#[async_trait]
impl ImageProvider for OpenAiImageProvider {
    async fn generate(&self, request: &GenerationRequest) -> Result<GeneratedImage> {
        if request.prompt.trim().is_empty() {
            return Err(CocktailError::InvalidRequest("prompt is empty".into()));
        }
        let start = Instant::now();

        let body = OpenAiImageRequest::from_generation_request(request, &self.model, &self.quality);
        let response = self.connection.post_json(GENERATIONS_PATH, &body).await?;
        let openai_response: OpenAiImageResponse = response.json().await?;

        let image_data = openai_response.data.into_iter().next().ok_or_else(|| {
            CocktailError::UnexpectedResponse("No images in OpenAI response".into())
        })?;

        // dall-e-3 answers with a URL, gpt-image-1 with inline base64
        let url = if let Some(url) = image_data.url {
            url
        } else if let Some(b64) = image_data.b64_json {
            format!("data:image/png;base64,{}", b64)
        } else {
            return Err(CocktailError::UnexpectedResponse(
                "OpenAI response contained no image data".into(),
            ));
        };

        let duration_ms = start.elapsed().as_millis() as u64;
        tracing::info!(model = self.model.as_str(), duration_ms, "image generated");

        Ok(GeneratedImage::new(
            url,
            GenerationMetadata {
                model: Some(self.model.as_str().to_string()),
                duration_ms: Some(duration_ms),
                revised_prompt: image_data.revised_prompt,
            },
        ))
    }

    fn name(&self) -> &str {
        "OpenAI Images"
    }

    async fn health_check(&self) -> Result<()> {
        self.connection.health_check()
    }
}

#[derive(Debug, Serialize)]
struct OpenAiImageRequest {
    model: String,
    prompt: String,
    n: u32,
    size: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    quality: Option<String>,
}

impl OpenAiImageRequest {
    fn from_generation_request(
        req: &GenerationRequest,
        model: &OpenAiImageModel,
        quality: &Option<String>,
    ) -> Self {
        Self {
            model: model.as_str().to_string(),
            prompt: req.prompt.clone(),
            n: 1,
            size: req.size.clone(),
            quality: quality.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct OpenAiImageResponse {
    data: Vec<OpenAiImageData>,
}

#[derive(Debug, Deserialize)]
struct OpenAiImageData {
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    b64_json: Option<String>,
    #[serde(default)]
    revised_prompt: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_as_str() {
        assert_eq!(OpenAiImageModel::DallE3.as_str(), "dall-e-3");
        assert_eq!(OpenAiImageModel::GptImage1.as_str(), "gpt-image-1");
    }

    #[test]
    fn test_builder_with_model() {
        let provider = OpenAiImageProviderBuilder::new()
            .api_key("sk-test")
            .model(OpenAiImageModel::GptImage1)
            .build()
            .unwrap();
        assert_eq!(provider.model(), OpenAiImageModel::GptImage1);
        assert!(provider.quality.is_none());
        assert!(provider.has_api_key());
    }

    #[test]
    fn test_builder_quality_defaults_per_model() {
        let dalle = OpenAiImageProviderBuilder::new().api_key("sk-test").build().unwrap();
        assert_eq!(dalle.quality.as_deref(), Some("standard"));

        let hd = OpenAiImageProviderBuilder::new()
            .api_key("sk-test")
            .model(OpenAiImageModel::GptImage1)
            .quality("high")
            .build()
            .unwrap();
        assert_eq!(hd.quality.as_deref(), Some("high"));
    }

    #[test]
    fn test_request_construction_defaults() {
        let req = GenerationRequest::new("A sunset");
        let quality = Some("standard".to_string());
        let openai_req =
            OpenAiImageRequest::from_generation_request(&req, &OpenAiImageModel::DallE3, &quality);
        let json = serde_json::to_value(&openai_req).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "model": "dall-e-3",
                "prompt": "A sunset",
                "n": 1,
                "size": "1024x1024",
                "quality": "standard",
            })
        );
    }

    #[test]
    fn test_request_without_quality_omits_field() {
        let req = GenerationRequest::new("A sunset");
        let openai_req =
            OpenAiImageRequest::from_generation_request(&req, &OpenAiImageModel::GptImage1, &None);
        let json = serde_json::to_value(&openai_req).unwrap();

        assert_eq!(json["model"], "gpt-image-1");
        assert!(json.get("quality").is_none());
    }

    #[test]
    fn test_response_deserialization_url() {
        let json = r#"{"data": [{"url": "https://example.com/img.png", "revised_prompt": "A beautiful sunset over the ocean"}]}"#;
        let resp: OpenAiImageResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.data.len(), 1);
        assert_eq!(
            resp.data[0].url.as_deref(),
            Some("https://example.com/img.png")
        );
        assert!(resp.data[0].revised_prompt.is_some());
    }

    #[test]
    fn test_response_deserialization_b64() {
        let json = r#"{"data": [{"b64_json": "AQID"}]}"#;
        let resp: OpenAiImageResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.data[0].b64_json.as_deref(), Some("AQID"));
        assert!(resp.data[0].url.is_none());
    }

    #[tokio::test]
    async fn test_empty_prompt_rejected_before_call() {
        let provider = OpenAiImageProviderBuilder::new()
            .api_key("sk-test")
            .base_url("http://127.0.0.1:1")
            .build()
            .unwrap();
        let err = provider
            .generate(&GenerationRequest::new("   "))
            .await
            .unwrap_err();
        assert!(matches!(err, CocktailError::InvalidRequest(_)));
    }
}
