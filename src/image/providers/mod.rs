//! Image generation providers.

mod openai;

pub use openai::{OpenAiImageModel, OpenAiImageProvider, OpenAiImageProviderBuilder};
