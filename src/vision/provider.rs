//! Vision provider trait and the fan-out over the three uploads.

use crate::error::Result;
use crate::image::{Role, UploadedImage};
use crate::vision::types::{Description, DescriptionSet, UploadSet};
use async_trait::async_trait;

/// Trait for vision-capable models that caption an uploaded image.
#[async_trait]
pub trait VisionProvider: Send + Sync {
    /// Returns a short description of `image`, suitable for embedding in a prompt.
    async fn describe(&self, image: &UploadedImage) -> Result<String>;

    /// Returns the name of this provider for display.
    fn name(&self) -> &str;

    /// Checks if the provider is configured and authenticated.
    async fn health_check(&self) -> Result<()>;
}

/// Describes all three uploads concurrently.
///
/// A failed call becomes [`Description::Failed`] for its role; it never
/// cancels or fails the other two. No retries are attempted.
pub async fn describe_all<P: VisionProvider + ?Sized>(
    provider: &P,
    uploads: &UploadSet,
) -> DescriptionSet {
    let describe = |role: Role| async move {
        let result = provider.describe(uploads.get(role)).await;
        if let Err(e) = &result {
            tracing::warn!(%role, provider = provider.name(), "description failed: {e}");
        }
        Description::from_result(role, result)
    };

    let (glass, garniture, bite) = tokio::join!(
        describe(Role::Glass),
        describe(Role::Garniture),
        describe(Role::Bite)
    );

    DescriptionSet {
        glass,
        garniture,
        bite,
    }
}
