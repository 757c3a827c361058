//! Types for the compressor module.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

use crate::encoder::EncodeError;

/// Rate-control mode of one encode pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PassKind {
    Crf,
    Bitrate,
}

impl fmt::Display for PassKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Crf => f.write_str("crf"),
            Self::Bitrate => f.write_str("bitrate"),
        }
    }
}

/// One encode pass and what it produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodeAttempt {
    pub pass_kind: PassKind,
    /// CRF value or bitrate in bits/second.
    pub parameter: u64,
    pub resulting_size_bytes: u64,
}

/// A compressed output that fits the budget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressionReport {
    pub output_path: PathBuf,
    pub size_bytes: u64,
    pub budget_bytes: u64,
    /// Every pass in order; the last one is the accepted one.
    pub attempts: Vec<EncodeAttempt>,
}

impl CompressionReport {
    /// Number of bitrate passes that were needed.
    pub fn bitrate_passes(&self) -> usize {
        self.attempts
            .iter()
            .filter(|a| a.pass_kind == PassKind::Bitrate)
            .count()
    }
}

/// Errors from size-targeted compression.
#[derive(Debug, Error)]
pub enum CompressError {
    /// The source duration is unknown, so no bitrate can be derived.
    #[error("Cannot determine source duration: {reason}")]
    DurationUnknown { reason: String },

    /// The bounded bitrate search ran out of passes.
    #[error(
        "Could not fit {budget_bytes} bytes after {bitrate_passes} bitrate passes (smallest result {best_size_bytes} bytes)"
    )]
    SizeTargetUnreachable {
        budget_bytes: u64,
        best_size_bytes: u64,
        bitrate_passes: u32,
    },

    /// An encode pass failed outright.
    #[error(transparent)]
    Encode(#[from] EncodeError),
}
