//! Uploads and image generation.

mod provider;
pub mod providers;
mod types;

pub use provider::ImageProvider;
pub use types::{
    GeneratedImage, GenerationMetadata, GenerationRequest, ImageFormat, Role, UploadedImage,
    DEFAULT_QUALITY, DEFAULT_SIZE,
};
