//! Per-user workflow state: upload slots, the editable prompt and the last result.
//!
//! A [`Session`] is explicit storage handed to each action. Analyze fills the
//! prompt, the user may edit it any number of times, and generate reads it.
//!
//! ```text
//! Idle -> DescribingImages -> PromptReady -> Generating -> ImageShown
//!                                  ^              |            |
//!                                  |              +--> ErrorShown
//!                                  |                       |   |
//!                                  +------- (edit) --------+---+
//! ```

use crate::error::{CocktailError, Result};
use crate::image::{GeneratedImage, GenerationRequest, ImageProvider, Role, UploadedImage};
use crate::prompt::{compose, PromptState, DEFAULT_COLOR};
use crate::vision::{describe_all, UploadSet, VisionProvider};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Where a session is in the analyze/edit/generate flow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Nothing analyzed yet.
    #[default]
    Idle,
    /// Description calls in flight.
    DescribingImages,
    /// A prompt is composed and may be edited.
    PromptReady,
    /// Generation call in flight.
    Generating,
    /// The last generation produced an image.
    ImageShown,
    /// The last generation failed; the prompt is kept.
    ErrorShown,
}

impl SessionState {
    /// Returns the state as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::DescribingImages => "describing_images",
            Self::PromptReady => "prompt_ready",
            Self::Generating => "generating",
            Self::ImageShown => "image_shown",
            Self::ErrorShown => "error_shown",
        }
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn default_color() -> String {
    DEFAULT_COLOR.to_string()
}

/// One user's session.
///
/// Uploads live only in memory; serializing a session keeps the colour, the
/// prompt, the last image and the last error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    #[serde(skip)]
    glass: Option<UploadedImage>,
    #[serde(skip)]
    garniture: Option<UploadedImage>,
    #[serde(skip)]
    bite: Option<UploadedImage>,
    #[serde(default = "default_color")]
    color: String,
    #[serde(default)]
    prompt: Option<PromptState>,
    #[serde(default)]
    image: Option<GeneratedImage>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    state: SessionState,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            glass: None,
            garniture: None,
            bite: None,
            color: default_color(),
            prompt: None,
            image: None,
            error: None,
            state: SessionState::Idle,
        }
    }
}

impl Session {
    /// Creates an empty session with the default colour.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a session saved with [`Session::save`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }

    /// Writes the session (without uploads) as JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    fn slot_mut(&mut self, role: Role) -> &mut Option<UploadedImage> {
        match role {
            Role::Glass => &mut self.glass,
            Role::Garniture => &mut self.garniture,
            Role::Bite => &mut self.bite,
        }
    }

    /// Returns the upload in `role`'s slot.
    pub fn upload_for(&self, role: Role) -> Option<&UploadedImage> {
        match role {
            Role::Glass => self.glass.as_ref(),
            Role::Garniture => self.garniture.as_ref(),
            Role::Bite => self.bite.as_ref(),
        }
    }

    /// Places an upload into its slot, replacing any previous one.
    pub fn upload(&mut self, image: UploadedImage) {
        let role = image.role();
        tracing::debug!(%role, size = image.size(), "image uploaded");
        *self.slot_mut(role) = Some(image);
    }

    /// Reads a JPEG or PNG file into `role`'s slot.
    pub fn upload_path(&mut self, role: Role, path: impl AsRef<Path>) -> Result<()> {
        self.upload(UploadedImage::from_path(role, path)?);
        Ok(())
    }

    /// Empties `role`'s slot.
    pub fn clear_upload(&mut self, role: Role) {
        *self.slot_mut(role) = None;
    }

    /// Roles that still need an upload.
    pub fn missing_roles(&self) -> Vec<Role> {
        Role::ALL
            .into_iter()
            .filter(|r| self.upload_for(*r).is_none())
            .collect()
    }

    /// Liquid colour used by the next analyze.
    pub fn color(&self) -> &str {
        &self.color
    }

    /// Sets the liquid colour.
    pub fn set_color(&mut self, color: impl Into<String>) {
        self.color = color.into();
    }

    /// Current workflow state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// The composed or edited prompt, once analyzed.
    pub fn prompt(&self) -> Option<&PromptState> {
        self.prompt.as_ref()
    }

    /// The image from the last successful generation.
    pub fn image(&self) -> Option<&GeneratedImage> {
        self.image.as_ref()
    }

    /// Message from the last failed generation.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Describes the three uploads and composes a fresh prompt.
    ///
    /// With any slot empty this returns [`CocktailError::MissingImages`] and
    /// makes no call. Description failures do not fail the action: they are
    /// composed into the prompt and listed in [`PromptState::failed_roles`].
    pub async fn analyze<V: VisionProvider + ?Sized>(&mut self, vision: &V) -> Result<&PromptState> {
        let (Some(glass), Some(garniture), Some(bite)) = (
            self.glass.clone(),
            self.garniture.clone(),
            self.bite.clone(),
        ) else {
            return Err(CocktailError::MissingImages(self.missing_roles()));
        };
        let uploads = UploadSet::new(glass, garniture, bite)?;

        self.state = SessionState::DescribingImages;
        tracing::info!(provider = vision.name(), "describing images");
        let descriptions = describe_all(vision, &uploads).await;

        let prompt = compose(&descriptions, &self.color);
        if prompt.is_degraded() {
            tracing::warn!(failed = ?prompt.failed_roles(), "prompt composed with failed descriptions");
        }

        self.image = None;
        self.error = None;
        self.state = SessionState::PromptReady;
        Ok(&*self.prompt.insert(prompt))
    }

    /// Replaces the prompt text. Requires a prior analyze.
    ///
    /// Any image or error from an earlier generation is dropped and the
    /// session returns to [`SessionState::PromptReady`].
    pub fn edit_prompt(&mut self, text: impl Into<String>) -> Result<()> {
        let prompt = self.prompt.as_mut().ok_or(CocktailError::NoPrompt)?;
        prompt.replace(text);
        self.image = None;
        self.error = None;
        self.state = SessionState::PromptReady;
        Ok(())
    }

    /// Generates the cocktail from the current prompt text.
    ///
    /// On failure the previous image is dropped, the error is kept for
    /// display and the state becomes [`SessionState::ErrorShown`]; the prompt
    /// stays so the user can edit and try again.
    pub async fn generate<G: ImageProvider + ?Sized>(
        &mut self,
        generator: &G,
    ) -> Result<&GeneratedImage> {
        let text = self
            .prompt
            .as_ref()
            .ok_or(CocktailError::NoPrompt)?
            .text()
            .to_string();

        self.image = None;
        if text.trim().is_empty() {
            return Err(self.fail(CocktailError::InvalidRequest("prompt is empty".into())));
        }

        self.state = SessionState::Generating;
        tracing::info!(provider = generator.name(), "generating image");
        match generator.generate(&GenerationRequest::new(text)).await {
            Ok(image) => {
                self.error = None;
                self.state = SessionState::ImageShown;
                Ok(&*self.image.insert(image))
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    fn fail(&mut self, e: CocktailError) -> CocktailError {
        tracing::warn!("image generation failed: {e}");
        self.error = Some(format!("Error generating image: {e}"));
        self.state = SessionState::ErrorShown;
        e
    }
}
