//! Trait definitions for the encoder module.

use async_trait::async_trait;
use std::path::Path;

use super::error::{EncodeError, ProbeError};
use super::types::{EncodeCommand, EncodeOutput};

/// An external transcoding/probing tool.
///
/// Implementations are black boxes with two guarantees callers rely on: a
/// successful `run` has written `command.output_path`, and `probe_duration`
/// returns a positive finite number of seconds for valid media.
#[async_trait]
pub trait MediaEncoder: Send + Sync {
    /// Returns the name of this encoder implementation.
    fn name(&self) -> &str;

    /// Runs one encode and reports the size of what it wrote.
    async fn run(&self, command: &EncodeCommand) -> Result<EncodeOutput, EncodeError>;

    /// Probes the duration of a media file in seconds.
    async fn probe_duration(&self, path: &Path) -> Result<f64, ProbeError>;

    /// Validates that the encoder and prober are installed and invocable.
    async fn validate(&self) -> Result<(), EncodeError>;
}
