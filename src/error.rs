//! Error types for the cocktail workflow.

use crate::image::Role;
use std::time::Duration;

/// Longest error message kept from an API response body.
const MAX_ERROR_MESSAGE_LEN: usize = 500;

/// Errors that can occur while describing images or generating the cocktail.
#[derive(Debug, thiserror::Error)]
pub enum CocktailError {
    /// API key missing or invalid.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Message extracted from the response body.
        message: String,
    },

    /// Rate limit exceeded.
    #[error("rate limited, retry after {retry_after:?}")]
    RateLimited {
        /// Delay suggested by the `Retry-After` header.
        retry_after: Option<Duration>,
    },

    /// Account has no credit or quota left.
    #[error("billing error: {0}")]
    Billing(String),

    /// Content was blocked by safety filters.
    #[error("content blocked: {0}")]
    ContentBlocked(String),

    /// Invalid request parameters.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Uploaded file is not a JPEG or PNG image.
    #[error("unsupported image format for {role}: expected JPEG or PNG")]
    UnsupportedFormat {
        /// Slot the file was uploaded to.
        role: Role,
    },

    /// Analyze was requested before every slot had an image.
    #[error("please upload all 3 images (missing: {})", join_roles(.0))]
    MissingImages(Vec<Role>),

    /// Generate was requested before a prompt was composed.
    #[error("no prompt yet: analyze the images first")]
    NoPrompt,

    /// Response had an unexpected shape.
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),

    /// Network or HTTP error.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Failed to decode base64 data.
    #[error("failed to decode: {0}")]
    Decode(String),

    /// I/O error (e.g., reading an upload or saving the image).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CocktailError {
    /// Returns true if the user should see this as a warning rather than a failure.
    pub fn is_warning(&self) -> bool {
        matches!(self, Self::MissingImages(_) | Self::NoPrompt)
    }
}

fn join_roles(roles: &[Role]) -> String {
    roles
        .iter()
        .map(|r| r.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Result type alias for cocktail workflow operations.
pub type Result<T> = std::result::Result<T, CocktailError>;

/// Reduces an API error body to a short human-readable message.
///
/// OpenAI wraps errors as `{"error": {"message": "..."}}`; the inner message is
/// preferred when present. Long bodies are truncated on a char boundary.
pub(crate) fn sanitize_error_message(body: &str) -> String {
    let message = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.pointer("/error/message")
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.trim().to_string());

    if message.chars().count() <= MAX_ERROR_MESSAGE_LEN {
        return message;
    }
    let truncated: String = message.chars().take(MAX_ERROR_MESSAGE_LEN).collect();
    format!("{truncated}...")
}

/// Reads `Retry-After` as whole seconds.
pub(crate) fn parse_retry_after(headers: &reqwest::header::HeaderMap) -> Option<u64> {
    headers
        .get(reqwest::header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}
