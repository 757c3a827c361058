//! Audio acquisition: streaming the tagged audio down to the workspace.
//!
//! A download is accepted only if the server answers with a success status,
//! declares an audio (or generic binary) content type, stays under the byte
//! ceiling both in its `Content-Length` and in what actually arrives, and
//! ends up larger than the plausibility floor.

mod config;
mod error;
mod http;
mod traits;

pub use config::DownloadConfig;
pub use error::AcquireError;
pub use http::{download_file_name, is_acceptable_content_type, HttpFetcher};
pub use traits::{AudioFetcher, DownloadedAudio};
