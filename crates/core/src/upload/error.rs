//! Error types for the upload module.

use thiserror::Error;

/// Errors that can occur while uploading audio.
#[derive(Debug, Error)]
pub enum UploadError {
    /// Connection or transfer failure.
    #[error("Upload request failed: {0}")]
    Request(String),

    /// Endpoint answered with something other than 200.
    #[error("Upload failed with status {status}")]
    HttpStatus { status: u16, body: String },

    /// Endpoint answered 200 but the body is not a URL.
    #[error("Upload response is not a URL: {body:?}")]
    InvalidResponse { body: String },

    /// Reading the local file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for UploadError {
    fn from(e: reqwest::Error) -> Self {
        Self::Request(e.to_string())
    }
}
