//! Configuration for the upload endpoint.

use serde::{Deserialize, Serialize};

/// Multipart upload endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Endpoint that accepts the multipart POST.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Form field carrying the file.
    #[serde(default = "default_file_field")]
    pub file_field: String,

    /// Value of the `reqtype` form field.
    #[serde(default = "default_reqtype")]
    pub reqtype: String,

    /// Account hash; uploads are anonymous when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub userhash: Option<String>,

    /// TCP connect timeout in seconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

fn default_endpoint() -> String {
    "https://catbox.moe/user/api.php".to_string()
}

fn default_file_field() -> String {
    "fileToUpload".to_string()
}

fn default_reqtype() -> String {
    "fileupload".to_string()
}

fn default_connect_timeout() -> u64 {
    30
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            file_field: default_file_field(),
            reqtype: default_reqtype(),
            userhash: None,
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

impl UploadConfig {
    /// Config pointing at a custom endpoint.
    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Default::default()
        }
    }
}
