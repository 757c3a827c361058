//! Error types for the encoder module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors from running the external encoder.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// Encoder binary not found.
    #[error("Encoder not found at path: {path}")]
    EncoderNotFound { path: PathBuf },

    /// Encoder exited with a non-zero status.
    #[error("Encoding failed: {reason}")]
    ProcessFailed {
        reason: String,
        stderr: Option<String>,
    },

    /// Encoder reported success but the declared output is missing.
    #[error("Encoder did not produce {path}")]
    OutputMissing { path: PathBuf },

    /// I/O error while spawning or inspecting the encoder.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl EncodeError {
    /// Creates a process failed error with the captured diagnostic.
    pub fn process_failed(reason: impl Into<String>, stderr: Option<String>) -> Self {
        Self::ProcessFailed {
            reason: reason.into(),
            stderr,
        }
    }

    /// Diagnostic output the encoder produced, if any.
    pub fn diagnostic(&self) -> Option<&str> {
        match self {
            Self::ProcessFailed { stderr, .. } => stderr.as_deref(),
            _ => None,
        }
    }
}

/// Errors from probing a media file's duration.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// Prober binary not found.
    #[error("Prober not found at path: {path}")]
    ProberNotFound { path: PathBuf },

    /// Input file not found.
    #[error("Input file not found: {path}")]
    InputNotFound { path: PathBuf },

    /// Prober exited with a non-zero status.
    #[error("Probe failed: {reason}")]
    ProbeFailed { reason: String },

    /// Prober output was not a number.
    #[error("Unparseable probe output: {output:?}")]
    Unparseable { output: String },

    /// Prober returned a duration that is not positive and finite.
    #[error("Invalid media duration: {value}")]
    InvalidDuration { value: f64 },

    /// I/O error while spawning the prober.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ProbeError {
    /// Creates a new probe failed error.
    pub fn probe_failed(reason: impl Into<String>) -> Self {
        Self::ProbeFailed {
            reason: reason.into(),
        }
    }
}
