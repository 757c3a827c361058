//! Mock encoder for testing.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::encoder::{EncodeCommand, EncodeError, EncodeOutput, MediaEncoder, ProbeError};

/// Size of outputs when nothing has been scripted.
const DEFAULT_OUTPUT_SIZE: u64 = 2048;

/// Mock implementation of the MediaEncoder trait.
///
/// Provides controllable behavior for testing:
/// - Record every command for assertions
/// - Script the size of successive outputs
/// - Control the probed duration or make probing fail
/// - Simulate encoder failures
///
/// When the output's parent directory exists, the mock creates a sparse file
/// of the scripted size there, so later pipeline stages find a real file.
///
/// # Example
///
/// ```rust,ignore
/// use soundpost_core::testing::MockEncoder;
///
/// let encoder = MockEncoder::new();
/// encoder.push_output_size(9_000_000).await; // quality pass overshoots
/// encoder.push_output_size(3_000_000).await; // bitrate pass fits
/// encoder.set_duration(60.0).await;
/// ```
#[derive(Debug)]
pub struct MockEncoder {
    /// Recorded commands, in order.
    commands: Arc<RwLock<Vec<EncodeCommand>>>,
    /// Sizes handed out to successive runs.
    output_sizes: Arc<RwLock<VecDeque<u64>>>,
    /// Duration reported by probes.
    duration_secs: Arc<RwLock<f64>>,
    /// Paths that were probed.
    probes: Arc<RwLock<Vec<PathBuf>>>,
    /// If set, the next run fails with this error.
    next_error: Arc<RwLock<Option<EncodeError>>>,
    /// If set, the next probe fails with this error.
    probe_error: Arc<RwLock<Option<ProbeError>>>,
    /// Whether validate() reports the binaries missing.
    missing: Arc<RwLock<bool>>,
}

impl Default for MockEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl MockEncoder {
    /// Create a new mock encoder.
    pub fn new() -> Self {
        Self {
            commands: Arc::new(RwLock::new(Vec::new())),
            output_sizes: Arc::new(RwLock::new(VecDeque::new())),
            duration_secs: Arc::new(RwLock::new(30.0)),
            probes: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
            probe_error: Arc::new(RwLock::new(None)),
            missing: Arc::new(RwLock::new(false)),
        }
    }

    /// Queue the size of the next output.
    pub async fn push_output_size(&self, size_bytes: u64) {
        self.output_sizes.write().await.push_back(size_bytes);
    }

    /// Set the duration returned by probes.
    pub async fn set_duration(&self, secs: f64) {
        *self.duration_secs.write().await = secs;
    }

    /// Configure the next run to fail with the given error.
    pub async fn set_next_error(&self, error: EncodeError) {
        *self.next_error.write().await = Some(error);
    }

    /// Configure the next probe to fail with the given error.
    pub async fn set_probe_error(&self, error: ProbeError) {
        *self.probe_error.write().await = Some(error);
    }

    /// Make validate() fail as if the binaries were not installed.
    pub async fn set_missing(&self, missing: bool) {
        *self.missing.write().await = missing;
    }

    /// Get all recorded commands.
    pub async fn commands(&self) -> Vec<EncodeCommand> {
        self.commands.read().await.clone()
    }

    /// Number of probes performed.
    pub async fn probe_count(&self) -> usize {
        self.probes.read().await.len()
    }

    /// Paths that were probed, in order.
    pub async fn probed_paths(&self) -> Vec<PathBuf> {
        self.probes.read().await.clone()
    }

    async fn materialize(path: &Path, size_bytes: u64) -> Result<(), EncodeError> {
        let parent_exists = match path.parent() {
            Some(parent) => tokio::fs::metadata(parent).await.is_ok(),
            None => false,
        };
        if !parent_exists {
            return Ok(());
        }
        let file = tokio::fs::File::create(path).await?;
        file.set_len(size_bytes).await?;
        Ok(())
    }
}

#[async_trait]
impl MediaEncoder for MockEncoder {
    fn name(&self) -> &str {
        "mock"
    }

    async fn run(&self, command: &EncodeCommand) -> Result<EncodeOutput, EncodeError> {
        self.commands.write().await.push(command.clone());

        if let Some(err) = self.next_error.write().await.take() {
            return Err(err);
        }

        let size_bytes = self
            .output_sizes
            .write()
            .await
            .pop_front()
            .unwrap_or(DEFAULT_OUTPUT_SIZE);
        Self::materialize(&command.output_path, size_bytes).await?;

        Ok(EncodeOutput {
            output_path: command.output_path.clone(),
            size_bytes,
            duration_ms: 1,
        })
    }

    async fn probe_duration(&self, path: &Path) -> Result<f64, ProbeError> {
        self.probes.write().await.push(path.to_path_buf());

        if let Some(err) = self.probe_error.write().await.take() {
            return Err(err);
        }
        Ok(*self.duration_secs.read().await)
    }

    async fn validate(&self) -> Result<(), EncodeError> {
        if *self.missing.read().await {
            return Err(EncodeError::EncoderNotFound {
                path: PathBuf::from("ffmpeg"),
            });
        }
        Ok(())
    }
}
