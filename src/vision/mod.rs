//! Image description through vision-capable chat models.

mod provider;
pub mod providers;
mod types;

pub use provider::{describe_all, VisionProvider};
pub use types::{Description, DescriptionSet, UploadSet};
