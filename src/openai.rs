//! Connection settings and error mapping shared by the OpenAI providers.

use crate::error::{parse_retry_after, sanitize_error_message, CocktailError, Result};
use std::time::Duration;

/// Default API base URL.
pub(crate) const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Environment variable holding the API key.
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Environment variable overriding the API base URL.
pub const BASE_URL_ENV: &str = "OPENAI_BASE_URL";

/// Resolved connection settings.
///
/// A missing key is not an error here: every call reports it instead, so a
/// front-end can start without credentials.
#[derive(Clone)]
pub(crate) struct OpenAiConnection {
    client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
}

impl OpenAiConnection {
    pub(crate) fn resolve(
        api_key: Option<String>,
        base_url: Option<String>,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        let api_key = api_key
            .or_else(|| std::env::var(API_KEY_ENV).ok())
            .filter(|k| !k.trim().is_empty());
        let base_url = base_url
            .or_else(|| std::env::var(BASE_URL_ENV).ok())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            api_key,
            base_url,
        })
    }

    pub(crate) fn client(&self) -> &reqwest::Client {
        &self.client
    }

    pub(crate) fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    pub(crate) fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub(crate) fn api_key(&self) -> Result<&str> {
        self.api_key.as_deref().ok_or_else(|| {
            CocktailError::Auth(format!("{API_KEY_ENV} not set and no API key provided"))
        })
    }

    /// Sends a JSON POST and returns the successful response.
    pub(crate) async fn post_json<B: serde::Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<reqwest::Response> {
        let api_key = self.api_key()?;
        let url = self.endpoint(path);
        tracing::debug!(%url, "sending OpenAI request");

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", api_key))
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let headers = response.headers().clone();
            let text = response.text().await.unwrap_or_default();
            return Err(parse_error(status.as_u16(), &text, &headers));
        }
        Ok(response)
    }

    pub(crate) fn health_check(&self) -> Result<()> {
        if self.api_key()?.starts_with("sk-") {
            Ok(())
        } else {
            Err(CocktailError::Auth("Invalid API key format".into()))
        }
    }
}

impl std::fmt::Debug for OpenAiConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiConnection")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Maps an error response to a [`CocktailError`].
pub(crate) fn parse_error(
    status: u16,
    text: &str,
    headers: &reqwest::header::HeaderMap,
) -> CocktailError {
    let text = sanitize_error_message(text);
    if status == 402 {
        return CocktailError::Billing(text);
    }
    if status == 413 {
        return CocktailError::InvalidRequest(
            "Image too large. Reduce image size and try again.".into(),
        );
    }
    if status == 429 {
        // insufficient_quota is not transient
        if text.contains("insufficient_quota") || text.contains("exceeded your current quota") {
            return CocktailError::Billing(text);
        }
        let retry_after = parse_retry_after(headers).map(Duration::from_secs);
        return CocktailError::RateLimited { retry_after };
    }
    if status == 401 || status == 403 {
        return CocktailError::Auth(text);
    }
    let lower = text.to_lowercase();
    if lower.contains("safety") || lower.contains("blocked") || lower.contains("content_policy") {
        return CocktailError::ContentBlocked(text);
    }
    CocktailError::Api {
        status,
        message: text,
    }
}
