//! Error types for audio acquisition.

use thiserror::Error;

/// Errors that can occur while acquiring audio.
#[derive(Debug, Error)]
pub enum AcquireError {
    /// The URL could not be parsed.
    #[error("Invalid audio URL: {0}")]
    InvalidUrl(String),

    /// Connection or transfer failure.
    #[error("Download request failed: {0}")]
    Request(String),

    /// Server answered with a non-success status.
    #[error("Failed to download audio. Status: {status}")]
    HttpStatus { status: u16 },

    /// Response is neither audio nor a generic binary stream.
    #[error("Expected audio content, got: {content_type}")]
    UnsupportedContentType { content_type: String },

    /// Content-Length exceeds the safety ceiling; nothing was streamed.
    #[error("Audio exceeds the {limit} byte limit ({size} bytes advertised)")]
    AdvertisedTooLarge { limit: u64, size: u64 },

    /// Stream crossed the safety ceiling mid-transfer and was aborted.
    #[error("Audio exceeded the {limit} byte limit during transfer")]
    StreamTooLarge { limit: u64 },

    /// Payload is too small to be real audio.
    #[error("Audio is too small to be valid ({size} bytes, minimum {min})")]
    PayloadTooSmall { size: u64, min: u64 },

    /// Local I/O failure while writing the payload.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl AcquireError {
    /// Short machine-readable name of the failure.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidUrl(_) => "invalid_url",
            Self::Request(_) => "request",
            Self::HttpStatus { .. } => "http_status",
            Self::UnsupportedContentType { .. } => "content_type",
            Self::AdvertisedTooLarge { .. } | Self::StreamTooLarge { .. } => "too_large",
            Self::PayloadTooSmall { .. } => "too_small",
            Self::Io(_) => "io",
        }
    }
}

impl From<reqwest::Error> for AcquireError {
    fn from(e: reqwest::Error) -> Self {
        Self::Request(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AcquireError::HttpStatus { status: 404 };
        assert_eq!(err.to_string(), "Failed to download audio. Status: 404");

        let err = AcquireError::AdvertisedTooLarge { limit: 10, size: 20 };
        assert_eq!(err.to_string(), "Audio exceeds the 10 byte limit (20 bytes advertised)");

        let err = AcquireError::UnsupportedContentType {
            content_type: "text/html".to_string(),
        };
        assert_eq!(err.to_string(), "Expected audio content, got: text/html");
    }

    #[test]
    fn test_kinds_are_distinct() {
        let kinds = [
            AcquireError::HttpStatus { status: 500 }.kind(),
            AcquireError::UnsupportedContentType {
                content_type: String::new(),
            }
            .kind(),
            AcquireError::StreamTooLarge { limit: 1 }.kind(),
            AcquireError::PayloadTooSmall { size: 1, min: 2 }.kind(),
        ];
        for (i, a) in kinds.iter().enumerate() {
            for b in &kinds[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }
}
