//! Mock audio fetcher for testing.

use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::acquire::{AcquireError, AudioFetcher, DownloadedAudio};

/// Mock implementation of the AudioFetcher trait.
///
/// Writes a fixed payload to the destination and records requested URLs.
#[derive(Debug)]
pub struct MockFetcher {
    requested: Arc<RwLock<Vec<String>>>,
    payload: Arc<RwLock<Vec<u8>>>,
    content_type: Arc<RwLock<String>>,
    next_error: Arc<RwLock<Option<AcquireError>>>,
}

impl Default for MockFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl MockFetcher {
    /// Create a new mock fetcher serving 4 KiB of audio/mpeg.
    pub fn new() -> Self {
        Self {
            requested: Arc::new(RwLock::new(Vec::new())),
            payload: Arc::new(RwLock::new(vec![0u8; 4096])),
            content_type: Arc::new(RwLock::new("audio/mpeg".to_string())),
            next_error: Arc::new(RwLock::new(None)),
        }
    }

    /// Set the bytes written on download.
    pub async fn set_payload(&self, payload: Vec<u8>) {
        *self.payload.write().await = payload;
    }

    /// Set the reported content type.
    pub async fn set_content_type(&self, content_type: impl Into<String>) {
        *self.content_type.write().await = content_type.into();
    }

    /// Configure the next download to fail with the given error.
    pub async fn set_next_error(&self, error: AcquireError) {
        *self.next_error.write().await = Some(error);
    }

    /// URLs requested so far.
    pub async fn requested_urls(&self) -> Vec<String> {
        self.requested.read().await.clone()
    }
}

#[async_trait]
impl AudioFetcher for MockFetcher {
    fn name(&self) -> &str {
        "mock"
    }

    async fn download(&self, url: &str, dest: &Path) -> Result<DownloadedAudio, AcquireError> {
        self.requested.write().await.push(url.to_string());

        if let Some(err) = self.next_error.write().await.take() {
            return Err(err);
        }

        let payload = self.payload.read().await.clone();
        tokio::fs::write(dest, &payload).await?;

        Ok(DownloadedAudio {
            path: dest.to_path_buf(),
            size_bytes: payload.len() as u64,
            content_type: self.content_type.read().await.clone(),
        })
    }
}
