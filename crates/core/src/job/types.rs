//! Types for the job module.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use tokio::sync::oneshot;

use crate::encoder::Container;

/// Which way a job converts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobMode {
    /// Download the tagged audio and mux it into the visual file.
    Inject,
    /// Host the file's own audio and re-tag a silent, size-bounded copy.
    Extract,
}

impl JobMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Inject => "inject",
            Self::Extract => "extract",
        }
    }
}

impl fmt::Display for JobMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "inject" => Ok(Self::Inject),
            "extract" => Ok(Self::Extract),
            other => Err(format!("unknown mode: {}", other)),
        }
    }
}

/// One unit of work. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRequest {
    pub source_path: PathBuf,
    pub mode: JobMode,
    /// Keep the source file after the output is placed.
    pub preserve_original: bool,
    /// Byte budget of the extract-mode output.
    pub target_size_bytes: u64,
    pub container: Container,
}

impl JobRequest {
    /// Creates a request with the usual defaults: keep the original, 4 MiB, mp4.
    pub fn new(source_path: impl Into<PathBuf>, mode: JobMode) -> Self {
        Self {
            source_path: source_path.into(),
            mode,
            preserve_original: true,
            target_size_bytes: 4 * 1024 * 1024,
            container: Container::Mp4,
        }
    }

    pub fn with_preserve_original(mut self, preserve: bool) -> Self {
        self.preserve_original = preserve;
        self
    }

    pub fn with_target_size(mut self, bytes: u64) -> Self {
        self.target_size_bytes = bytes;
        self
    }

    pub fn with_container(mut self, container: Container) -> Self {
        self.container = container;
        self
    }
}

/// Stage of a running job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Validating,
    Acquiring,
    Transforming,
    /// Extract mode only.
    Targeting,
    Finalizing,
    Succeeded,
    Failed,
    CancelledByUser,
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::CancelledByUser)
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Validating => "validating",
            Self::Acquiring => "acquiring",
            Self::Transforming => "transforming",
            Self::Targeting => "targeting",
            Self::Finalizing => "finalizing",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
            Self::CancelledByUser => "cancelled",
        };
        f.write_str(s)
    }
}

/// Terminal result of a job. Exactly one per request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum JobOutcome {
    Succeeded {
        final_path: PathBuf,
        /// Where the audio now lives (extract mode).
        hosted_url: Option<String>,
    },
    Failed {
        kind: String,
        message: String,
    },
    /// The user declined to overwrite an existing destination.
    CancelledByUser,
}

impl JobOutcome {
    /// Label used in metrics.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Succeeded { .. } => "succeeded",
            Self::Failed { .. } => "failed",
            Self::CancelledByUser => "cancelled",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded { .. })
    }

    pub fn final_state(&self) -> JobState {
        match self {
            Self::Succeeded { .. } => JobState::Succeeded,
            Self::Failed { .. } => JobState::Failed,
            Self::CancelledByUser => JobState::CancelledByUser,
        }
    }
}

/// Messages from the job worker to the presentation layer.
#[derive(Debug)]
pub enum JobEvent {
    /// The job entered a new stage.
    State(JobState),
    /// A human-readable status line.
    Log(String),
    /// The destination exists; the worker waits for a yes/no on `reply`.
    /// Dropping `reply` counts as "no".
    ConfirmOverwrite {
        path: PathBuf,
        reply: oneshot::Sender<bool>,
    },
    /// The job is over. Always the last event.
    Finished(JobOutcome),
}
