//! Encoder module: the contract over the external transcoder/prober.
//!
//! The pipeline never spawns processes itself. It builds an
//! [`EncodeCommand`] and hands it to a [`MediaEncoder`], which is either the
//! real [`FfmpegEncoder`] or a scripted fake in tests.
//!
//! # Example
//!
//! ```ignore
//! use soundpost_core::encoder::{FfmpegEncoder, MediaEncoder, Transcoder, AudioCodec};
//!
//! let encoder = Arc::new(FfmpegEncoder::with_defaults());
//! encoder.validate().await?;
//!
//! let transcoder = Transcoder::new(Arc::clone(&encoder));
//! transcoder
//!     .audio_to_codec(Path::new("in.mp3"), Path::new("out.m4a"), AudioCodec::Aac)
//!     .await?;
//! ```

mod config;
mod error;
mod ffmpeg;
mod ops;
mod traits;
mod types;

pub use config::EncoderConfig;
pub use error::{EncodeError, ProbeError};
pub use ffmpeg::FfmpegEncoder;
pub use ops::{
    audio_to_codec_command, image_to_video_command, mux_command, TranscodeError, Transcoder,
};
pub use traits::MediaEncoder;
pub use types::{AudioCodec, Container, EncodeCommand, EncodeOutput, VideoCodec};
