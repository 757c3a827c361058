//! Configuration for audio downloads.

use serde::{Deserialize, Serialize};

/// Download safety bounds and client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadConfig {
    /// Hard ceiling on downloaded bytes.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: u64,

    /// Payloads smaller than this are not plausible audio.
    #[serde(default = "default_min_bytes")]
    pub min_bytes: u64,

    /// User-Agent header sent with every request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// TCP connect timeout in seconds. The transfer itself is not timed out.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

fn default_max_bytes() -> u64 {
    200 * 1024 * 1024 // 200 MiB
}

fn default_min_bytes() -> u64 {
    1024
}

fn default_user_agent() -> String {
    "Mozilla/5.0".to_string()
}

fn default_connect_timeout() -> u64 {
    30
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            max_bytes: default_max_bytes(),
            min_bytes: default_min_bytes(),
            user_agent: default_user_agent(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

impl DownloadConfig {
    /// Sets the byte ceiling.
    pub fn with_max_bytes(mut self, max_bytes: u64) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    /// Sets the minimum plausible size.
    pub fn with_min_bytes(mut self, min_bytes: u64) -> Self {
        self.min_bytes = min_bytes;
        self
    }
}
