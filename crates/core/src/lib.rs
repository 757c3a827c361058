pub mod acquire;
pub mod classify;
pub mod compressor;
pub mod config;
pub mod encoder;
pub mod job;
pub mod metrics;
pub mod tag;
pub mod testing;
pub mod upload;

pub use acquire::{AcquireError, AudioFetcher, DownloadConfig, HttpFetcher};
pub use classify::{classify, AssetKind};
pub use compressor::{CompressError, CompressorConfig, SizeTargetingCompressor};
pub use config::{load_config, load_config_from_str, validate_config, Config, ConfigError};
pub use encoder::{
    AudioCodec, Container, EncodeError, EncoderConfig, FfmpegEncoder, MediaEncoder, ProbeError,
};
pub use job::{
    JobConfig, JobError, JobEvent, JobMode, JobOutcome, JobRequest, JobRunner, JobState,
    RunnerSettings, Workspace,
};
pub use tag::SoundTag;
pub use upload::{AudioHost, CatboxHost, UploadConfig, UploadError};
