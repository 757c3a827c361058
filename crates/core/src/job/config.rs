//! Configuration for jobs.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::types::{JobMode, JobRequest};
use crate::compressor::CompressorConfig;
use crate::encoder::{AudioCodec, Container};

/// Defaults applied to job requests, and where workspaces go.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobConfig {
    /// Byte budget of extract-mode output.
    #[serde(default = "default_target_size")]
    pub target_size_bytes: u64,

    /// Output container.
    #[serde(default)]
    pub container: Container,

    /// Keep the source file after placing the output.
    #[serde(default = "default_preserve")]
    pub preserve_original: bool,

    /// Parent directory for workspaces (system temp dir if unset).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace_root: Option<PathBuf>,

    /// Codec of the audio extracted for upload.
    #[serde(default = "default_extracted_audio")]
    pub extracted_audio: AudioCodec,
}

fn default_target_size() -> u64 {
    4 * 1024 * 1024
}

fn default_preserve() -> bool {
    true
}

fn default_extracted_audio() -> AudioCodec {
    AudioCodec::Mp3
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            target_size_bytes: default_target_size(),
            container: Container::default(),
            preserve_original: default_preserve(),
            workspace_root: None,
            extracted_audio: default_extracted_audio(),
        }
    }
}

impl JobConfig {
    /// Builds a request for `source` using these defaults.
    pub fn request(&self, source: impl AsRef<Path>, mode: JobMode) -> JobRequest {
        JobRequest::new(source.as_ref(), mode)
            .with_preserve_original(self.preserve_original)
            .with_target_size(self.target_size_bytes)
            .with_container(self.container)
    }
}

/// Everything the runner needs besides its collaborators.
#[derive(Debug, Clone, Default)]
pub struct RunnerSettings {
    pub job: JobConfig,
    pub compressor: CompressorConfig,
    /// Smallest plausible extracted audio, in bytes.
    pub min_audio_bytes: u64,
}

impl RunnerSettings {
    pub fn new(job: JobConfig, compressor: CompressorConfig, min_audio_bytes: u64) -> Self {
        Self {
            job,
            compressor,
            min_audio_bytes,
        }
    }

    /// Sets the workspace root.
    pub fn with_workspace_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.job.workspace_root = Some(root.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = JobConfig::default();
        assert_eq!(config.target_size_bytes, 4_194_304);
        assert_eq!(config.container, Container::Mp4);
        assert!(config.preserve_original);
        assert_eq!(config.extracted_audio, AudioCodec::Mp3);
    }

    #[test]
    fn test_request_uses_defaults() {
        let config = JobConfig {
            container: Container::Webm,
            preserve_original: false,
            ..Default::default()
        };
        let req = config.request("/x/clip.mp4", JobMode::Extract);
        assert_eq!(req.container, Container::Webm);
        assert!(!req.preserve_original);
        assert_eq!(req.target_size_bytes, 4_194_304);
    }

    #[test]
    fn test_deserialize() {
        let config: JobConfig = toml::from_str(
            r#"
            container = "webm"
            target_size_bytes = 3145728
        "#,
        )
        .unwrap();
        assert_eq!(config.container, Container::Webm);
        assert_eq!(config.target_size_bytes, 3_145_728);
        assert!(config.preserve_original);
    }
}
