use serde::{Deserialize, Serialize};

use crate::acquire::DownloadConfig;
use crate::compressor::CompressorConfig;
use crate::encoder::EncoderConfig;
use crate::job::{JobConfig, RunnerSettings};
use crate::upload::UploadConfig;

/// Placeholder shown instead of secrets.
const REDACTED: &str = "<redacted>";

/// Main configuration structure. Every section is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub encoder: EncoderConfig,
    #[serde(default)]
    pub download: DownloadConfig,
    #[serde(default)]
    pub upload: UploadConfig,
    #[serde(default)]
    pub compressor: CompressorConfig,
    #[serde(default)]
    pub job: JobConfig,
}

impl Config {
    /// Settings handed to the job runner.
    pub fn runner_settings(&self) -> RunnerSettings {
        RunnerSettings::new(
            self.job.clone(),
            self.compressor.clone(),
            self.download.min_bytes,
        )
    }

    /// Copy of the configuration that is safe to print.
    pub fn sanitized(&self) -> Config {
        let mut config = self.clone();
        if config.upload.userhash.is_some() {
            config.upload.userhash = Some(REDACTED.to_string());
        }
        config
    }
}
