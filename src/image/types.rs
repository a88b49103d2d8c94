//! Core types for uploads and image generation.

use crate::error::{CocktailError, Result};
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Square size requested from the generation model.
pub const DEFAULT_SIZE: &str = "1024x1024";

/// Quality tier requested from the generation model.
pub const DEFAULT_QUALITY: &str = "standard";

/// Supported upload formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    /// PNG format (lossless).
    #[default]
    Png,
    /// JPEG format (lossy).
    Jpeg,
}

impl ImageFormat {
    /// Returns the file extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
        }
    }

    /// Returns the MIME type for this format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
        }
    }

    /// Attempts to detect format from file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            _ => None,
        }
    }

    /// Detects image format from magic bytes.
    pub fn from_magic_bytes(data: &[u8]) -> Option<Self> {
        // PNG: 89 50 4E 47 0D 0A 1A 0A
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
            return Some(Self::Png);
        }

        // JPEG: FF D8 FF
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(Self::Jpeg);
        }

        None
    }
}

/// Which part of the cocktail an uploaded image represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The glass the cocktail is served in.
    Glass,
    /// Garnish resting on the rim.
    Garniture,
    /// Garnish floating in the liquid.
    Bite,
}

impl Role {
    /// All roles in upload order.
    pub const ALL: [Role; 3] = [Role::Glass, Role::Garniture, Role::Bite];

    /// Returns the role label used in instructions and error text.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Glass => "glass",
            Self::Garniture => "garniture",
            Self::Bite => "bite",
        }
    }

    /// Returns the label shown next to the upload slot.
    pub fn slot_label(&self) -> &'static str {
        match self {
            Self::Glass => "Glass",
            Self::Garniture => "Garniture (on rim)",
            Self::Bite => "Bite (floating inside)",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An image the user uploaded into one of the three slots.
#[derive(Clone)]
pub struct UploadedImage {
    role: Role,
    format: ImageFormat,
    data: Vec<u8>,
}

impl UploadedImage {
    /// Wraps raw bytes, rejecting anything that is not JPEG or PNG.
    pub fn new(role: Role, data: Vec<u8>) -> Result<Self> {
        let format =
            ImageFormat::from_magic_bytes(&data).ok_or(CocktailError::UnsupportedFormat { role })?;
        Ok(Self { role, format, data })
    }

    /// Reads an upload from disk. The extension must be `.jpg`, `.jpeg` or `.png`.
    pub fn from_path(role: Role, path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let accepted = path
            .extension()
            .and_then(|e| e.to_str())
            .and_then(ImageFormat::from_extension)
            .is_some();
        if !accepted {
            return Err(CocktailError::UnsupportedFormat { role });
        }
        Self::new(role, std::fs::read(path)?)
    }

    /// Slot this image was uploaded to.
    pub fn role(&self) -> Role {
        self.role
    }

    /// Format detected from the content.
    pub fn format(&self) -> ImageFormat {
        self.format
    }

    /// Returns the size of the image data in bytes.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Encodes the image as a base64 data URL.
    pub fn to_data_url(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.format.mime_type(),
            base64::engine::general_purpose::STANDARD.encode(&self.data)
        )
    }
}

impl std::fmt::Debug for UploadedImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadedImage")
            .field("role", &self.role)
            .field("format", &self.format)
            .field("size", &self.data.len())
            .finish()
    }
}

/// Metadata about the generation process.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationMetadata {
    /// Model used for generation.
    pub model: Option<String>,
    /// Generation duration in milliseconds.
    pub duration_ms: Option<u64>,
    /// Prompt as rewritten by the model, if it reported one.
    pub revised_prompt: Option<String>,
}

/// A request to generate an image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// The text prompt describing the desired image.
    pub prompt: String,
    /// Requested size, e.g. `1024x1024`.
    pub size: String,
}

impl GenerationRequest {
    /// Creates a new square request with the given prompt.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            size: DEFAULT_SIZE.to_string(),
        }
    }
}

/// A generated image reference returned by the generation model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedImage {
    /// Where the image can be fetched. Either a transient `https` URL or a
    /// `data:` URL when the model returned the image inline.
    pub url: String,
    /// Generation metadata.
    pub metadata: GenerationMetadata,
}

impl GeneratedImage {
    /// Creates a new generated image reference.
    pub fn new(url: impl Into<String>, metadata: GenerationMetadata) -> Self {
        Self {
            url: url.into(),
            metadata,
        }
    }

    /// Returns true if the image bytes are embedded in the URL.
    pub fn is_inline(&self) -> bool {
        self.url.starts_with("data:")
    }

    /// Fetches the image bytes behind the reference.
    pub async fn download(&self, client: &reqwest::Client) -> Result<Vec<u8>> {
        if self.is_inline() {
            let b64 = self
                .url
                .split_once(";base64,")
                .map(|(_, payload)| payload)
                .ok_or_else(|| CocktailError::Decode("data URL is not base64".into()))?;
            return base64::engine::general_purpose::STANDARD
                .decode(b64)
                .map_err(|e| CocktailError::Decode(e.to_string()));
        }

        tracing::debug!(url = %self.url, "downloading generated image");
        let response = client.get(&self.url).send().await?;
        if !response.status().is_success() {
            return Err(CocktailError::Api {
                status: response.status().as_u16(),
                message: "Failed to download image from URL".into(),
            });
        }
        Ok(response.bytes().await?.to_vec())
    }

    /// Downloads the image and writes it to `path`.
    ///
    /// Returns the number of bytes written.
    pub async fn save(&self, client: &reqwest::Client, path: impl AsRef<Path>) -> Result<usize> {
        let data = self.download(client).await?;
        std::fs::write(path, &data)?;
        Ok(data.len())
    }
}
