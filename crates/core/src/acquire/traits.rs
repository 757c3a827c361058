//! Trait definitions for audio acquisition.

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use super::error::AcquireError;

/// Audio written to disk by a fetcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedAudio {
    /// Where the payload was written.
    pub path: PathBuf,
    /// Bytes written.
    pub size_bytes: u64,
    /// Content type the server declared.
    pub content_type: String,
}

/// Fetches remote audio into a local file.
///
/// One attempt per call; implementations never retry.
#[async_trait]
pub trait AudioFetcher: Send + Sync {
    /// Returns the name of this fetcher implementation.
    fn name(&self) -> &str;

    /// Downloads `url` into `dest`.
    async fn download(&self, url: &str, dest: &Path) -> Result<DownloadedAudio, AcquireError>;
}
