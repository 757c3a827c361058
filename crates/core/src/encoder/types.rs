//! Types for the encoder module.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Audio codec family used for intermediate and final audio streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioCodec {
    /// Advanced Audio Coding (mp4 family)
    Aac,
    /// Opus (webm family)
    Opus,
    /// MPEG Audio Layer III (what gets uploaded)
    Mp3,
}

impl AudioCodec {
    /// Returns the ffmpeg encoder name for this codec.
    pub fn ffmpeg_codec(&self) -> &'static str {
        match self {
            Self::Aac => "aac",
            Self::Opus => "libopus",
            Self::Mp3 => "libmp3lame",
        }
    }

    /// Returns the file extension of a standalone stream in this codec.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Aac => "m4a",
            Self::Opus => "opus",
            Self::Mp3 => "mp3",
        }
    }

    /// Sample rate in Hz.
    pub fn sample_rate_hz(&self) -> u32 {
        match self {
            Self::Opus => 48_000,
            Self::Aac | Self::Mp3 => 44_100,
        }
    }

    /// Channel count.
    pub fn channels(&self) -> u8 {
        2
    }

    /// Bitrate in kbps.
    pub fn bitrate_kbps(&self) -> u32 {
        match self {
            Self::Aac | Self::Mp3 => 192,
            Self::Opus => 128,
        }
    }
}

/// Video codec family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VideoCodec {
    /// H.264 / AVC
    H264,
    /// VP9
    Vp9,
}

impl VideoCodec {
    /// Returns the ffmpeg encoder name for this codec.
    pub fn ffmpeg_codec(&self) -> &'static str {
        match self {
            Self::H264 => "libx264",
            Self::Vp9 => "libvpx-vp9",
        }
    }

    /// Constant-quality arguments.
    pub fn crf_args(&self, crf: u8) -> Vec<String> {
        match self {
            Self::H264 => vec!["-crf".to_string(), crf.to_string()],
            // VP9 only honours CRF when the target bitrate is zeroed.
            Self::Vp9 => vec![
                "-crf".to_string(),
                crf.to_string(),
                "-b:v".to_string(),
                "0".to_string(),
            ],
        }
    }

    /// Constrained-bitrate arguments: peak rate and buffer pinned to the nominal rate.
    pub fn bitrate_args(&self, bitrate_bps: u64) -> Vec<String> {
        let rate = bitrate_bps.to_string();
        vec![
            "-b:v".to_string(),
            rate.clone(),
            "-maxrate".to_string(),
            rate.clone(),
            "-bufsize".to_string(),
            rate,
        ]
    }

    /// Encoder speed arguments.
    pub fn speed_args(&self, preset: &str) -> Vec<String> {
        match self {
            Self::H264 => vec!["-preset".to_string(), preset.to_string()],
            Self::Vp9 => vec![
                "-deadline".to_string(),
                "good".to_string(),
                "-cpu-used".to_string(),
                vp9_cpu_used(preset).to_string(),
            ],
        }
    }
}

/// Maps an x264-style preset name onto libvpx's `-cpu-used` scale.
fn vp9_cpu_used(preset: &str) -> u8 {
    match preset {
        "ultrafast" | "superfast" => 8,
        "veryfast" | "faster" => 6,
        "fast" => 4,
        "medium" => 2,
        _ => 1,
    }
}

/// Output container for the finished soundpost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Container {
    #[default]
    Mp4,
    Webm,
}

impl Container {
    /// File extension, without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Mp4 => "mp4",
            Self::Webm => "webm",
        }
    }

    /// Video codec used inside this container.
    pub fn video_codec(&self) -> VideoCodec {
        match self {
            Self::Mp4 => VideoCodec::H264,
            Self::Webm => VideoCodec::Vp9,
        }
    }

    /// Audio codec used inside this container.
    pub fn audio_codec(&self) -> AudioCodec {
        match self {
            Self::Mp4 => AudioCodec::Aac,
            Self::Webm => AudioCodec::Opus,
        }
    }

    /// Muxer flags appended after the streams.
    pub fn muxer_args(&self) -> Vec<String> {
        match self {
            Self::Mp4 => vec!["-movflags".to_string(), "+faststart".to_string()],
            Self::Webm => Vec::new(),
        }
    }
}

impl fmt::Display for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for Container {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mp4" => Ok(Self::Mp4),
            "webm" => Ok(Self::Webm),
            other => Err(format!("unsupported container: {}", other)),
        }
    }
}

/// A single encoder invocation: operation arguments plus the file it must produce.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodeCommand {
    /// Operation arguments (inputs, codecs, output path last).
    pub args: Vec<String>,
    /// Path the encoder is expected to write.
    pub output_path: PathBuf,
}

impl EncodeCommand {
    /// Whether the argument list contains `flag` immediately followed by `value`.
    pub fn has_arg_pair(&self, flag: &str, value: &str) -> bool {
        self.args
            .windows(2)
            .any(|w| w[0] == flag && w[1] == value)
    }

    /// Returns the value following `flag`, if present.
    pub fn arg_value(&self, flag: &str) -> Option<&str> {
        self.args
            .windows(2)
            .find(|w| w[0] == flag)
            .map(|w| w[1].as_str())
    }
}

/// Result of a successful encoder run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeOutput {
    /// Path of the written file.
    pub output_path: PathBuf,
    /// Size of the written file in bytes.
    pub size_bytes: u64,
    /// Wall-clock time of the run in milliseconds.
    pub duration_ms: u64,
}
