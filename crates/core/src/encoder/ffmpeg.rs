//! FFmpeg-based encoder implementation.

use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use std::time::Instant;
use tokio::process::Command;
use tracing::debug;

use super::config::EncoderConfig;
use super::error::{EncodeError, ProbeError};
use super::traits::MediaEncoder;
use super::types::{EncodeCommand, EncodeOutput};

/// Number of trailing stderr lines kept as failure diagnostic.
const STDERR_TAIL_LINES: usize = 20;

/// FFmpeg/FFprobe-based encoder implementation.
pub struct FfmpegEncoder {
    config: EncoderConfig,
}

impl FfmpegEncoder {
    /// Creates a new FFmpeg encoder with the given configuration.
    pub fn new(config: EncoderConfig) -> Self {
        Self { config }
    }

    /// Creates an encoder with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(EncoderConfig::default())
    }

    /// Builds the full ffmpeg argument list for an operation.
    fn build_args(&self, command: &EncodeCommand) -> Vec<String> {
        let mut args = vec![
            "-hide_banner".to_string(),
            "-nostdin".to_string(),
            "-y".to_string(), // Overwrite output
            "-loglevel".to_string(),
            self.config.ffmpeg_log_level.clone(),
        ];

        // Extra args
        args.extend(self.config.extra_ffmpeg_args.iter().cloned());

        args.extend(command.args.iter().cloned());
        args
    }

    /// Parses the single-value duration output of ffprobe.
    fn parse_duration(output: &str) -> Result<f64, ProbeError> {
        let text = output.trim();
        let value = text
            .lines()
            .next()
            .unwrap_or_default()
            .trim()
            .parse::<f64>()
            .map_err(|_| ProbeError::Unparseable {
                output: text.to_string(),
            })?;

        if !value.is_finite() || value <= 0.0 {
            return Err(ProbeError::InvalidDuration { value });
        }
        Ok(value)
    }

    /// Keeps only the last lines of stderr.
    fn stderr_tail(stderr: &[u8]) -> Option<String> {
        let text = String::from_utf8_lossy(stderr);
        let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
        if lines.is_empty() {
            return None;
        }
        let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
        Some(lines[start..].join("\n"))
    }

    async fn check_binary(&self, path: &Path) -> Result<(), std::io::Error> {
        Command::new(path)
            .arg("-version")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map(|_| ())
    }
}

#[async_trait]
impl MediaEncoder for FfmpegEncoder {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    async fn run(&self, command: &EncodeCommand) -> Result<EncodeOutput, EncodeError> {
        let start = Instant::now();
        let args = self.build_args(command);
        debug!("Running {} {}", self.config.ffmpeg_path.display(), args.join(" "));

        let output = Command::new(&self.config.ffmpeg_path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    EncodeError::EncoderNotFound {
                        path: self.config.ffmpeg_path.clone(),
                    }
                } else {
                    EncodeError::Io(e)
                }
            })?;

        if !output.status.success() {
            return Err(EncodeError::process_failed(
                format!("FFmpeg exited with code: {:?}", output.status.code()),
                Self::stderr_tail(&output.stderr),
            ));
        }

        // Verify output exists and get size
        let meta = tokio::fs::metadata(&command.output_path)
            .await
            .map_err(|_| EncodeError::OutputMissing {
                path: command.output_path.clone(),
            })?;

        Ok(EncodeOutput {
            output_path: command.output_path.clone(),
            size_bytes: meta.len(),
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }

    async fn probe_duration(&self, path: &Path) -> Result<f64, ProbeError> {
        if !path.exists() {
            return Err(ProbeError::InputNotFound {
                path: path.to_path_buf(),
            });
        }

        let output = Command::new(&self.config.ffprobe_path)
            .args([
                "-v",
                "error",
                "-show_entries",
                "format=duration",
                "-of",
                "default=noprint_wrappers=1:nokey=1",
            ])
            .arg(path)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    ProbeError::ProberNotFound {
                        path: self.config.ffprobe_path.clone(),
                    }
                } else {
                    ProbeError::Io(e)
                }
            })?;

        if !output.status.success() {
            return Err(ProbeError::probe_failed(format!(
                "ffprobe failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        Self::parse_duration(&String::from_utf8_lossy(&output.stdout))
    }

    async fn validate(&self) -> Result<(), EncodeError> {
        for path in [&self.config.ffmpeg_path, &self.config.ffprobe_path] {
            if let Err(e) = self.check_binary(path).await {
                if e.kind() == std::io::ErrorKind::NotFound {
                    return Err(EncodeError::EncoderNotFound { path: path.clone() });
                }
                return Err(EncodeError::Io(e));
            }
        }
        Ok(())
    }
}
