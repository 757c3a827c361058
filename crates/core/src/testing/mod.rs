//! Testing utilities and mock implementations.
//!
//! This module provides mock implementations of the external collaborator
//! traits, so whole jobs can be exercised without ffmpeg or the network.
//!
//! # Example
//!
//! ```rust,ignore
//! use soundpost_core::testing::{MockEncoder, MockFetcher, MockHost};
//!
//! let encoder = Arc::new(MockEncoder::new());
//! let fetcher = Arc::new(MockFetcher::new());
//! let host = Arc::new(MockHost::new());
//!
//! let runner = JobRunner::new(encoder, fetcher, host, RunnerSettings::default());
//! ```

mod mock_encoder;
mod mock_fetcher;
mod mock_host;

pub use mock_encoder::MockEncoder;
pub use mock_fetcher::MockFetcher;
pub use mock_host::{MockHost, RecordedUpload};

/// Test fixtures and helper functions.
pub mod fixtures {
    use std::path::{Path, PathBuf};

    /// Minimal PNG signature followed by padding; enough for content sniffing.
    pub const PNG_BYTES: &[u8] = &[
        0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
        0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00,
    ];

    /// Start of an ISO-BMFF `ftyp` box, sniffed as video/mp4.
    pub const MP4_BYTES: &[u8] = &[
        0x00, 0x00, 0x00, 0x18, 0x66, 0x74, 0x79, 0x70, 0x6D, 0x70, 0x34, 0x32, 0x00, 0x00, 0x00,
        0x00, 0x6D, 0x70, 0x34, 0x32, 0x69, 0x73, 0x6F, 0x6D,
    ];

    /// ID3 header, sniffed as audio/mpeg.
    pub const MP3_BYTES: &[u8] = &[0x49, 0x44, 0x33, 0x04, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00];

    /// Write `bytes` to `dir/name` and return the path.
    pub fn write_file(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, bytes).expect("write fixture");
        path
    }
}
