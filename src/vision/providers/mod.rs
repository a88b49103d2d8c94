//! Vision providers.

mod openai;

pub use openai::{OpenAiVisionModel, OpenAiVisionProvider, OpenAiVisionProviderBuilder};
