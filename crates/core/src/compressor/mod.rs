//! Compressor module: fitting a silent video under a byte budget.

#[allow(clippy::module_inception)]
mod compressor;
mod config;
mod types;

pub use compressor::{estimate_bitrate, silent_video_command, RateControl, SizeTargetingCompressor};
pub use config::CompressorConfig;
pub use types::{CompressError, CompressionReport, EncodeAttempt, PassKind};
