//! OpenAI chat-completions vision provider (gpt-4o).

use crate::error::{CocktailError, Result};
use crate::image::{Role, UploadedImage};
use crate::openai::OpenAiConnection;
use crate::vision::provider::VisionProvider;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

const CHAT_COMPLETIONS_PATH: &str = "/chat/completions";

/// Default cap on caption length, in tokens.
pub const DEFAULT_MAX_TOKENS: u32 = 100;

/// OpenAI vision model variants.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OpenAiVisionModel {
    /// GPT-4o.
    #[default]
    Gpt4o,
    /// GPT-4o mini - cheaper, lower detail.
    Gpt4oMini,
}

impl OpenAiVisionModel {
    /// Returns the API model identifier string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gpt4o => "gpt-4o",
            Self::Gpt4oMini => "gpt-4o-mini",
        }
    }
}

/// Builder for OpenAiVisionProvider.
#[derive(Debug, Clone, Default)]
pub struct OpenAiVisionProviderBuilder {
    api_key: Option<String>,
    base_url: Option<String>,
    model: OpenAiVisionModel,
    max_tokens: Option<u32>,
    timeout: Option<Duration>,
}

impl OpenAiVisionProviderBuilder {
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

    /// Sets the vision model variant.
    pub fn model(mut self, model: OpenAiVisionModel) -> Self {
        self.model = model;
        self
    }

    /// Caps the caption length (default: 100 tokens).
    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Sets a whole-request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Builds the provider. A missing API key surfaces on the first call.
    pub fn build(self) -> Result<OpenAiVisionProvider> {
        Ok(OpenAiVisionProvider {
            connection: OpenAiConnection::resolve(self.api_key, self.base_url, self.timeout)?,
            model: self.model,
            max_tokens: self.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
        })
    }
}

/// Describes uploads with an OpenAI vision-capable chat model.
#[derive(Debug)]
pub struct OpenAiVisionProvider {
    connection: OpenAiConnection,
    model: OpenAiVisionModel,
    max_tokens: u32,
}

impl OpenAiVisionProvider {
    /// Creates a new `OpenAiVisionProviderBuilder`.
    pub fn builder() -> OpenAiVisionProviderBuilder {
        OpenAiVisionProviderBuilder::new()
    }

    /// Returns the configured model.
    pub fn model(&self) -> OpenAiVisionModel {
        self.model
    }

    /// Returns true if an API key was found.
    pub fn has_api_key(&self) -> bool {
        self.connection.has_api_key()
    }
}

/// System instruction naming the part of the cocktail being described.
fn system_instruction(role: Role) -> String {
    format!(
        "You are a visual assistant. Briefly describe this {} for photorealistic image generation.",
        role
    )
}

#[async_trait]
impl VisionProvider for OpenAiVisionProvider {
    async fn describe(&self, image: &UploadedImage) -> Result<String> {
        let start = Instant::now();
        let body = ChatRequest::for_image(image, self.model, self.max_tokens);

        let response = self
            .connection
            .post_json(CHAT_COMPLETIONS_PATH, &body)
            .await?;
        let chat: ChatResponse = response.json().await?;

        let text = chat
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| {
                CocktailError::UnexpectedResponse("No message content in OpenAI response".into())
            })?;

        tracing::debug!(
            role = %image.role(),
            duration_ms = start.elapsed().as_millis() as u64,
            "image described"
        );
        Ok(text.trim().to_string())
    }

    fn name(&self) -> &str {
        "OpenAI Vision"
    }

    async fn health_check(&self) -> Result<()> {
        self.connection.health_check()
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
}

impl ChatRequest {
    fn for_image(image: &UploadedImage, model: OpenAiVisionModel, max_tokens: u32) -> Self {
        Self {
            model: model.as_str().to_string(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: ChatContent::Text(system_instruction(image.role())),
                },
                ChatMessage {
                    role: "user",
                    content: ChatContent::Parts(vec![ContentPart::ImageUrl {
                        image_url: ImageUrl {
                            url: image.to_data_url(),
                        },
                    }]),
                },
            ],
            max_tokens,
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: ChatContent,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum ChatContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart {
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
}
