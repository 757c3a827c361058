//! Mock audio host for testing.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::upload::{AudioHost, UploadError};

/// A file handed to the mock host.
#[derive(Debug, Clone)]
pub struct RecordedUpload {
    pub path: PathBuf,
    pub size_bytes: u64,
}

/// Mock implementation of the AudioHost trait.
///
/// Returns a configurable URL and records what was uploaded.
#[derive(Debug)]
pub struct MockHost {
    uploads: Arc<RwLock<Vec<RecordedUpload>>>,
    url: Arc<RwLock<String>>,
    next_error: Arc<RwLock<Option<UploadError>>>,
}

impl Default for MockHost {
    fn default() -> Self {
        Self::new()
    }
}

impl MockHost {
    /// Create a new mock host.
    pub fn new() -> Self {
        Self {
            uploads: Arc::new(RwLock::new(Vec::new())),
            url: Arc::new(RwLock::new("https://files.example.com/abc123.mp3".to_string())),
            next_error: Arc::new(RwLock::new(None)),
        }
    }

    /// Set the URL returned for uploads.
    pub async fn set_url(&self, url: impl Into<String>) {
        *self.url.write().await = url.into();
    }

    /// Configure the next upload to fail with the given error.
    pub async fn set_next_error(&self, error: UploadError) {
        *self.next_error.write().await = Some(error);
    }

    /// Get all recorded uploads.
    pub async fn recorded_uploads(&self) -> Vec<RecordedUpload> {
        self.uploads.read().await.clone()
    }
}

#[async_trait]
impl AudioHost for MockHost {
    fn name(&self) -> &str {
        "mock"
    }

    async fn upload(&self, path: &Path) -> Result<String, UploadError> {
        let size_bytes = tokio::fs::metadata(path).await?.len();
        self.uploads.write().await.push(RecordedUpload {
            path: path.to_path_buf(),
            size_bytes,
        });

        if let Some(err) = self.next_error.write().await.take() {
            return Err(err);
        }
        Ok(self.url.read().await.clone())
    }
}
