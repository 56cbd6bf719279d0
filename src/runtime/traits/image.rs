// ABOUTME: Image operations trait for container runtimes.
// ABOUTME: Pulls images from their registry.

use super::shared_types::RegistryAuth;
use crate::types::ImageRef;
use async_trait::async_trait;

/// Image operations.
#[async_trait]
pub trait ImageOps: Send + Sync {
    /// Pull an image from its registry.
    async fn pull_image(
        &self,
        reference: &ImageRef,
        auth: Option<&RegistryAuth>,
    ) -> Result<(), ImageError>;
}

/// Errors from image operations.
#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    #[error("image not found: {0}")]
    NotFound(String),

    #[error("authentication failed for registry: {0}")]
    AuthenticationFailed(String),

    #[error("pull failed: {0}")]
    PullFailed(String),

    #[error("runtime error: {0}")]
    Runtime(String),
}
