//! Error taxonomy for jobs.

use thiserror::Error;

use crate::acquire::AcquireError;
use crate::compressor::CompressError;
use crate::encoder::{EncodeError, ProbeError, TranscodeError};
use crate::upload::UploadError;

/// Why a job failed. Every variant is fatal; nothing here is retried.
#[derive(Debug, Error)]
pub enum JobError {
    /// Missing tag, or the wrong kind of asset for the mode.
    #[error("Precondition failed: {0}")]
    Precondition(String),

    #[error("Audio acquisition failed: {0}")]
    Acquire(#[from] AcquireError),

    #[error("{0}")]
    Encode(#[from] EncodeError),

    #[error("{0}")]
    Probe(#[from] ProbeError),

    /// The bounded bitrate search gave up. Raising the budget may help.
    #[error(
        "Could not get the video under {budget_bytes} bytes (smallest attempt {best_size_bytes} bytes after {bitrate_passes} bitrate passes); try a larger size budget"
    )]
    SizeTargetUnreachable {
        budget_bytes: u64,
        best_size_bytes: u64,
        bitrate_passes: u32,
    },

    #[error("Upload failed: {0}")]
    Upload(#[from] UploadError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl JobError {
    /// Creates a precondition error.
    pub fn precondition(message: impl Into<String>) -> Self {
        Self::Precondition(message.into())
    }

    /// Stable identifier of the failure kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Precondition(_) => "precondition",
            Self::Acquire(_) => "acquire",
            Self::Encode(_) => "encode",
            Self::Probe(_) => "probe",
            Self::SizeTargetUnreachable { .. } => "size_target_unreachable",
            Self::Upload(_) => "upload",
            Self::Io(_) => "io",
        }
    }

    /// Human-readable message, including encoder diagnostics when present.
    pub fn message(&self) -> String {
        match self {
            Self::Encode(e) => match e.diagnostic() {
                Some(stderr) if !stderr.trim().is_empty() => format!("{}\n{}", e, stderr.trim()),
                _ => e.to_string(),
            },
            other => other.to_string(),
        }
    }
}

impl From<TranscodeError> for JobError {
    fn from(err: TranscodeError) -> Self {
        match err {
            TranscodeError::Encode(e) => Self::Encode(e),
            TranscodeError::Probe(e) => Self::Probe(e),
        }
    }
}

impl From<CompressError> for JobError {
    fn from(err: CompressError) -> Self {
        match err {
            CompressError::DurationUnknown { reason } => {
                Self::Probe(ProbeError::probe_failed(format!("duration unknown: {}", reason)))
            }
            CompressError::SizeTargetUnreachable {
                budget_bytes,
                best_size_bytes,
                bitrate_passes,
            } => Self::SizeTargetUnreachable {
                budget_bytes,
                best_size_bytes,
                bitrate_passes,
            },
            CompressError::Encode(e) => Self::Encode(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds() {
        assert_eq!(JobError::precondition("no tag").kind(), "precondition");
        assert_eq!(
            JobError::from(AcquireError::HttpStatus { status: 500 }).kind(),
            "acquire"
        );
        assert_eq!(
            JobError::from(UploadError::InvalidResponse {
                body: "nope".to_string()
            })
            .kind(),
            "upload"
        );
    }

    #[test]
    fn test_unreachable_stays_distinct() {
        let err = JobError::from(CompressError::SizeTargetUnreachable {
            budget_bytes: 100,
            best_size_bytes: 150,
            bitrate_passes: 3,
        });
        assert_eq!(err.kind(), "size_target_unreachable");
        assert!(err.to_string().contains("larger size budget"));
    }

    #[test]
    fn test_duration_unknown_is_probe() {
        let err = JobError::from(CompressError::DurationUnknown {
            reason: "N/A".to_string(),
        });
        assert_eq!(err.kind(), "probe");
    }

    #[test]
    fn test_message_includes_diagnostic() {
        let err = JobError::from(EncodeError::process_failed(
            "exit status 1",
            Some("Invalid data found when processing input\n".to_string()),
        ));
        let msg = err.message();
        assert!(msg.contains("exit status 1"));
        assert!(msg.ends_with("Invalid data found when processing input"));
    }
}
