//! Trait definitions for the upload module.

use async_trait::async_trait;
use std::path::Path;

use super::error::UploadError;

/// A remote service that hosts audio and hands back a public URL.
#[async_trait]
pub trait AudioHost: Send + Sync {
    /// Returns the name of this host implementation.
    fn name(&self) -> &str;

    /// Uploads a local file and returns its public URL.
    async fn upload(&self, path: &Path) -> Result<String, UploadError>;
}
