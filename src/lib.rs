#![warn(missing_docs)]
//! Cocktailviz - turn three component photos into a rendered cocktail.
//!
//! The workflow has two actions. *Analyze* captions the glass, the rim
//! garniture and the floating bite with a vision model and composes a
//! generation prompt. *Generate* sends the (possibly edited) prompt to an image
//! model and returns a URL to the picture.
//!
//! # Quick Start
//!
//! ```no_run
//! use cocktailviz::{OpenAiImageProvider, OpenAiVisionProvider, Role, Session};
//!
//! #[tokio::main]
//! async fn main() -> cocktailviz::Result<()> {
//!     let vision = OpenAiVisionProvider::builder().build()?;
//!     let images = OpenAiImageProvider::builder().build()?;
//!
//!     let mut session = Session::new();
//!     session.upload_path(Role::Glass, "glass.jpg")?;
//!     session.upload_path(Role::Garniture, "lime.png")?;
//!     session.upload_path(Role::Bite, "cherry.jpg")?;
//!     session.set_color("ruby");
//!
//!     println!("{}", session.analyze(&vision).await?.text());
//!     session.edit_prompt("A ruby negroni in a coupe. White background.")?;
//!
//!     let image = session.generate(&images).await?;
//!     println!("{}", image.url);
//!     Ok(())
//! }
//! ```

mod error;
pub mod image;
mod openai;
pub mod prompt;
pub mod session;
pub mod vision;

// Re-export error types at crate root
pub use error::{CocktailError, Result};

pub use image::providers::{OpenAiImageModel, OpenAiImageProvider, OpenAiImageProviderBuilder};
pub use image::{
    GeneratedImage, GenerationMetadata, GenerationRequest, ImageFormat, ImageProvider, Role,
    UploadedImage,
};
pub use openai::{API_KEY_ENV, BASE_URL_ENV};
pub use prompt::{compose, PromptState, DEFAULT_COLOR};
pub use session::{Session, SessionState};
pub use vision::providers::{
    OpenAiVisionModel, OpenAiVisionProvider, OpenAiVisionProviderBuilder,
};
pub use vision::{describe_all, Description, DescriptionSet, UploadSet, VisionProvider};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::error::{CocktailError, Result};
    pub use crate::image::providers::OpenAiImageProvider;
    pub use crate::image::{GeneratedImage, ImageProvider, Role, UploadedImage};
    pub use crate::session::{Session, SessionState};
    pub use crate::vision::providers::OpenAiVisionProvider;
    pub use crate::vision::VisionProvider;
}
