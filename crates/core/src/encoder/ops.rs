//! Transcoding operations built on top of [`MediaEncoder`].

use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

use super::error::{EncodeError, ProbeError};
use super::traits::MediaEncoder;
use super::types::{AudioCodec, Container, EncodeCommand, EncodeOutput};

/// CRF used when a visual stream is re-encoded for muxing.
const MUX_CRF_H264: u8 = 23;
const MUX_CRF_VP9: u8 = 32;

/// Preset used for every non-targeted encode.
const MUX_PRESET: &str = "fast";

/// Error from an operation that both probes and encodes.
#[derive(Debug, thiserror::Error)]
pub enum TranscodeError {
    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error(transparent)]
    Probe(#[from] ProbeError),
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

fn mux_crf(container: Container) -> u8 {
    match container {
        Container::Mp4 => MUX_CRF_H264,
        Container::Webm => MUX_CRF_VP9,
    }
}

fn audio_stream_args(codec: AudioCodec) -> Vec<String> {
    vec![
        "-c:a".to_string(),
        codec.ffmpeg_codec().to_string(),
        "-ac".to_string(),
        codec.channels().to_string(),
        "-ar".to_string(),
        codec.sample_rate_hz().to_string(),
        "-b:a".to_string(),
        format!("{}k", codec.bitrate_kbps()),
    ]
}

/// Drops any video and re-encodes the audio to `codec`.
pub fn audio_to_codec_command(input: &Path, output: &Path, codec: AudioCodec) -> EncodeCommand {
    let mut args = vec!["-i".to_string(), path_arg(input), "-vn".to_string()];
    args.extend(audio_stream_args(codec));
    args.push(path_arg(output));

    EncodeCommand {
        args,
        output_path: output.to_path_buf(),
    }
}

/// Loops a still image for `duration_secs`, copying the audio stream through.
pub fn image_to_video_command(
    image: &Path,
    audio: &Path,
    output: &Path,
    container: Container,
    duration_secs: f64,
) -> EncodeCommand {
    let video = container.video_codec();
    let mut args = vec![
        "-loop".to_string(),
        "1".to_string(),
        "-framerate".to_string(),
        "1".to_string(),
        "-i".to_string(),
        path_arg(image),
        "-i".to_string(),
        path_arg(audio),
        "-map".to_string(),
        "0:v:0".to_string(),
        "-map".to_string(),
        "1:a:0".to_string(),
        "-c:v".to_string(),
        video.ffmpeg_codec().to_string(),
    ];
    args.extend(video.crf_args(mux_crf(container)));
    args.extend(video.speed_args(MUX_PRESET));
    args.extend([
        // Even dimensions are required by yuv420p.
        "-vf".to_string(),
        "scale=trunc(iw/2)*2:trunc(ih/2)*2".to_string(),
        "-pix_fmt".to_string(),
        "yuv420p".to_string(),
        "-r".to_string(),
        "1".to_string(),
        "-c:a".to_string(),
        "copy".to_string(),
        "-t".to_string(),
        format!("{:.3}", duration_secs),
    ]);
    args.extend(container.muxer_args());
    args.push(path_arg(output));

    EncodeCommand {
        args,
        output_path: output.to_path_buf(),
    }
}

/// Re-encodes video and audio into `container`, cut to the shorter input.
pub fn mux_command(video: &Path, audio: &Path, output: &Path, container: Container) -> EncodeCommand {
    let video_codec = container.video_codec();
    let mut args = vec![
        "-i".to_string(),
        path_arg(video),
        "-i".to_string(),
        path_arg(audio),
        "-map".to_string(),
        "0:v:0".to_string(),
        "-map".to_string(),
        "1:a:0".to_string(),
        "-c:v".to_string(),
        video_codec.ffmpeg_codec().to_string(),
    ];
    args.extend(video_codec.crf_args(mux_crf(container)));
    args.extend(video_codec.speed_args(MUX_PRESET));
    args.extend(["-pix_fmt".to_string(), "yuv420p".to_string()]);
    args.extend(audio_stream_args(container.audio_codec()));
    args.push("-shortest".to_string());
    args.extend(container.muxer_args());
    args.push(path_arg(output));

    EncodeCommand {
        args,
        output_path: output.to_path_buf(),
    }
}

/// Runs the transcoding operations against an encoder.
pub struct Transcoder<E: MediaEncoder> {
    encoder: Arc<E>,
}

impl<E: MediaEncoder> Transcoder<E> {
    /// Creates a transcoder over a shared encoder.
    pub fn new(encoder: Arc<E>) -> Self {
        Self { encoder }
    }

    /// Strips video and re-encodes audio to `codec`.
    pub async fn audio_to_codec(
        &self,
        input: &Path,
        output: &Path,
        codec: AudioCodec,
    ) -> Result<EncodeOutput, EncodeError> {
        debug!(codec = codec.ffmpeg_codec(), "Converting audio {}", input.display());
        self.encoder
            .run(&audio_to_codec_command(input, output, codec))
            .await
    }

    /// Builds a video from a still image looped for the audio's duration.
    pub async fn image_to_video(
        &self,
        image: &Path,
        audio: &Path,
        output: &Path,
        container: Container,
    ) -> Result<EncodeOutput, TranscodeError> {
        let duration = self.encoder.probe_duration(audio).await?;
        info!(
            duration_secs = duration,
            "Synthesizing {} video from still image",
            container
        );
        let command = image_to_video_command(image, audio, output, container, duration);
        Ok(self.encoder.run(&command).await?)
    }

    /// Muxes a video with an audio track, re-encoding both.
    pub async fn mux(
        &self,
        video: &Path,
        audio: &Path,
        output: &Path,
        container: Container,
    ) -> Result<EncodeOutput, EncodeError> {
        info!("Muxing audio into {} container", container);
        self.encoder
            .run(&mux_command(video, audio, output, container))
            .await
    }
}
