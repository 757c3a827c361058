//! Upload module: publishing extracted audio and getting its URL back.

mod catbox;
mod config;
mod error;
mod traits;

pub use catbox::{parse_hosted_url, CatboxHost};
pub use config::UploadConfig;
pub use error::UploadError;
pub use traits::AudioHost;
