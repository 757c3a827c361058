//! Catbox-style multipart uploader.

use async_trait::async_trait;
use reqwest::{multipart, Client, StatusCode, Url};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

use super::config::UploadConfig;
use super::error::UploadError;
use super::traits::AudioHost;

/// Uploads files with a multipart POST and reads the URL from the body.
pub struct CatboxHost {
    client: Client,
    config: UploadConfig,
}

impl CatboxHost {
    /// Creates a new uploader.
    pub fn new(config: UploadConfig) -> Result<Self, UploadError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()?;

        Ok(Self { client, config })
    }

    /// Builds the multipart form for a file.
    fn build_form(&self, file_name: String, data: Vec<u8>, mime: &str) -> Result<multipart::Form, UploadError> {
        let part = multipart::Part::bytes(data)
            .file_name(file_name)
            .mime_str(mime)?;

        let mut form = multipart::Form::new()
            .text("reqtype", self.config.reqtype.clone())
            .part(self.config.file_field.clone(), part);

        if let Some(hash) = &self.config.userhash {
            form = form.text("userhash", hash.clone());
        }
        Ok(form)
    }
}

/// Validates an upload response body as an absolute http(s) URL.
pub fn parse_hosted_url(body: &str) -> Result<String, UploadError> {
    let text = body.trim();
    match Url::parse(text) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(text.to_string()),
        _ => Err(UploadError::InvalidResponse {
            body: text.chars().take(200).collect(),
        }),
    }
}

#[async_trait]
impl AudioHost for CatboxHost {
    fn name(&self) -> &str {
        "catbox"
    }

    async fn upload(&self, path: &Path) -> Result<String, UploadError> {
        let data = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "audio".to_string());
        let mime = mime_guess::from_path(path).first_or_octet_stream();

        info!("Uploading {} ({} bytes) to {}", file_name, data.len(), self.config.endpoint);
        let form = self.build_form(file_name, data, mime.essence_str())?;

        let response = self
            .client
            .post(&self.config.endpoint)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if status != StatusCode::OK {
            return Err(UploadError::HttpStatus {
                status: status.as_u16(),
                body: body.chars().take(200).collect(),
            });
        }

        let url = parse_hosted_url(&body)?;
        debug!("Upload complete: {}", url);
        Ok(url)
    }
}
