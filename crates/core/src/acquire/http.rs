//! Streaming HTTP downloader.

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Url};
use std::path::Path;
use std::time::Duration;
use tokio::fs::{self, File};
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, info, warn};

use super::config::DownloadConfig;
use super::error::AcquireError;
use super::traits::{AudioFetcher, DownloadedAudio};

/// Content types accepted besides `audio/*`.
const GENERIC_BINARY_TYPES: &[&str] = &["application/octet-stream", "binary/octet-stream"];

/// Downloads audio over HTTP(S) with a hard byte ceiling.
pub struct HttpFetcher {
    client: Client,
    config: DownloadConfig,
}

impl HttpFetcher {
    /// Creates a new fetcher.
    pub fn new(config: DownloadConfig) -> Result<Self, AcquireError> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()?;

        Ok(Self { client, config })
    }

    /// Creates a fetcher with default configuration.
    pub fn with_defaults() -> Result<Self, AcquireError> {
        Self::new(DownloadConfig::default())
    }
}

/// Returns the MIME essence of a Content-Type header value.
fn essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// Whether a Content-Type header denotes audio or a generic binary stream.
pub fn is_acceptable_content_type(content_type: &str) -> bool {
    let essence = essence(content_type);
    essence.starts_with("audio/") || GENERIC_BINARY_TYPES.contains(&essence.as_str())
}

/// Local file name for audio downloaded from `url`.
///
/// Keeps the extension of the URL path when it looks like one, otherwise `.bin`.
pub fn download_file_name(url: &str) -> String {
    let ext = Url::parse(url)
        .ok()
        .and_then(|u| {
            u.path_segments()
                .and_then(|mut segments| segments.next_back().map(str::to_string))
        })
        .and_then(|last| {
            Path::new(&last)
                .extension()
                .map(|e| e.to_string_lossy().to_ascii_lowercase())
        })
        .filter(|e| !e.is_empty() && e.len() <= 5 && e.chars().all(|c| c.is_ascii_alphanumeric()))
        .unwrap_or_else(|| "bin".to_string());
    format!("downloaded.{}", ext)
}

/// Writes a byte stream to `writer`, aborting once more than `limit` bytes arrive.
///
/// Returns the number of bytes written.
async fn write_capped<S, B, E, W>(stream: S, writer: &mut W, limit: u64) -> Result<u64, AcquireError>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: std::fmt::Display,
    W: tokio::io::AsyncWrite + Unpin,
{
    let mut stream = std::pin::pin!(stream);
    let mut written: u64 = 0;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| AcquireError::Request(e.to_string()))?;
        let bytes = chunk.as_ref();

        written += bytes.len() as u64;
        if written > limit {
            return Err(AcquireError::StreamTooLarge { limit });
        }

        writer.write_all(bytes).await?;
    }

    writer.flush().await?;
    Ok(written)
}

async fn discard_partial(dest: &Path) {
    if let Err(e) = fs::remove_file(dest).await {
        warn!("Failed to remove partial download {}: {}", dest.display(), e);
    }
}

#[async_trait]
impl AudioFetcher for HttpFetcher {
    fn name(&self) -> &str {
        "http"
    }

    async fn download(&self, url: &str, dest: &Path) -> Result<DownloadedAudio, AcquireError> {
        let url = Url::parse(url).map_err(|e| AcquireError::InvalidUrl(format!("{}: {}", url, e)))?;
        info!("Downloading audio from {}", url);

        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AcquireError::HttpStatus {
                status: status.as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        if !is_acceptable_content_type(&content_type) {
            return Err(AcquireError::UnsupportedContentType { content_type });
        }

        if let Some(advertised) = response.content_length() {
            if advertised > self.config.max_bytes {
                return Err(AcquireError::AdvertisedTooLarge {
                    limit: self.config.max_bytes,
                    size: advertised,
                });
            }
        }

        let file = File::create(dest).await?;
        let mut writer = BufWriter::new(file);
        let result = write_capped(response.bytes_stream(), &mut writer, self.config.max_bytes).await;
        drop(writer);

        let size_bytes = match result {
            Ok(size) => size,
            Err(e) => {
                discard_partial(dest).await;
                return Err(e);
            }
        };

        if size_bytes < self.config.min_bytes {
            discard_partial(dest).await;
            return Err(AcquireError::PayloadTooSmall {
                size: size_bytes,
                min: self.config.min_bytes,
            });
        }

        debug!(size_bytes, content_type = %content_type, "Download complete");

        Ok(DownloadedAudio {
            path: dest.to_path_buf(),
            size_bytes,
            content_type,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fetcher(max_bytes: u64) -> HttpFetcher {
        HttpFetcher::new(DownloadConfig::default().with_max_bytes(max_bytes)).unwrap()
    }

    #[test]
    fn test_content_type_rules() {
        assert!(is_acceptable_content_type("audio/mpeg"));
        assert!(is_acceptable_content_type("Audio/OGG; codecs=opus"));
        assert!(is_acceptable_content_type("application/octet-stream"));
        assert!(!is_acceptable_content_type("text/html; charset=utf-8"));
        assert!(!is_acceptable_content_type("video/mp4"));
        assert!(!is_acceptable_content_type(""));
    }

    #[test]
    fn test_download_file_name() {
        assert_eq!(download_file_name("https://h/a/song.MP3"), "downloaded.mp3");
        assert_eq!(download_file_name("https://h/a/track.ogg?dl=1"), "downloaded.ogg");
        assert_eq!(download_file_name("https://h/stream"), "downloaded.bin");
        assert_eq!(download_file_name("https://h/"), "downloaded.bin");
        assert_eq!(download_file_name("https://h/x.tar.gz%3Fweird"), "downloaded.bin");
        assert_eq!(download_file_name("nonsense"), "downloaded.bin");
    }

    #[tokio::test]
    async fn test_write_capped_aborts_mid_stream() {
        let chunks: Vec<Result<Vec<u8>, std::io::Error>> =
            vec![Ok(vec![0u8; 600]), Ok(vec![0u8; 600]), Ok(vec![0u8; 600])];
        let mut sink: Vec<u8> = Vec::new();

        let result = write_capped(futures::stream::iter(chunks), &mut sink, 1000).await;

        assert!(matches!(result, Err(AcquireError::StreamTooLarge { limit: 1000 })));
        // The chunk that crossed the limit is never written.
        assert_eq!(sink.len(), 600);
    }

    #[tokio::test]
    async fn test_write_capped_within_limit() {
        let chunks: Vec<Result<Vec<u8>, std::io::Error>> = vec![Ok(vec![1u8; 500]), Ok(vec![2u8; 500])];
        let mut sink: Vec<u8> = Vec::new();

        let written = write_capped(futures::stream::iter(chunks), &mut sink, 1000)
            .await
            .unwrap();

        assert_eq!(written, 1000);
        assert_eq!(sink.len(), 1000);
    }

    #[tokio::test]
    async fn test_download_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/a.mp3"))
            .and(header("user-agent", "Mozilla/5.0"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw(vec![7u8; 4096], "audio/mpeg"),
            )
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("downloaded.mp3");
        let audio = fetcher(1 << 20)
            .download(&format!("{}/a.mp3", server.uri()), &dest)
            .await
            .unwrap();

        assert_eq!(audio.size_bytes, 4096);
        assert_eq!(audio.content_type, "audio/mpeg");
        assert_eq!(std::fs::metadata(&dest).unwrap().len(), 4096);
    }

    #[tokio::test]
    async fn test_download_rejects_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let result = fetcher(1 << 20)
            .download(&format!("{}/missing.mp3", server.uri()), &dir.path().join("x"))
            .await;

        assert!(matches!(result, Err(AcquireError::HttpStatus { status: 404 })));
    }

    #[tokio::test]
    async fn test_download_rejects_html() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw("<html>not audio</html>", "text/html"),
            )
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let result = fetcher(1 << 20)
            .download(&format!("{}/page", server.uri()), &dir.path().join("x"))
            .await;

        assert!(matches!(
            result,
            Err(AcquireError::UnsupportedContentType { .. })
        ));
    }

    #[tokio::test]
    async fn test_download_rejects_advertised_oversize_before_streaming() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw(vec![0u8; 8192], "application/octet-stream"),
            )
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("big.bin");
        let result = fetcher(4096)
            .download(&format!("{}/big.bin", server.uri()), &dest)
            .await;

        assert!(matches!(
            result,
            Err(AcquireError::AdvertisedTooLarge {
                limit: 4096,
                size: 8192
            })
        ));
        assert!(!dest.exists(), "nothing should be written");
    }

    /// Serves one chunked response without a Content-Length header.
    async fn serve_chunked(body_chunks: usize, chunk_len: usize) -> String {
        use tokio::io::AsyncReadExt;
        use tokio::net::TcpListener;

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = vec![0u8; 4096];
            let _ = socket.read(&mut request).await;

            let head = "HTTP/1.1 200 OK\r\nContent-Type: audio/mpeg\r\n\
                        Transfer-Encoding: chunked\r\nConnection: close\r\n\r\n";
            if socket.write_all(head.as_bytes()).await.is_err() {
                return;
            }
            let chunk = vec![b'a'; chunk_len];
            for _ in 0..body_chunks {
                let framed = [
                    format!("{:x}\r\n", chunk_len).into_bytes(),
                    chunk.clone(),
                    b"\r\n".to_vec(),
                ]
                .concat();
                if socket.write_all(&framed).await.is_err() {
                    return;
                }
            }
            let _ = socket.write_all(b"0\r\n\r\n").await;
            let _ = socket.shutdown().await;
        });
        format!("http://{}/stream.mp3", addr)
    }

    #[tokio::test]
    async fn test_download_aborts_unadvertised_oversize_and_removes_partial() {
        let url = serve_chunked(4, 2048).await;

        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("stream.mp3");
        let result = fetcher(4096).download(&url, &dest).await;

        assert!(matches!(result, Err(AcquireError::StreamTooLarge { limit: 4096 })));
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn test_download_unadvertised_within_cap() {
        let url = serve_chunked(2, 2048).await;

        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("stream.mp3");
        let audio = fetcher(8192).download(&url, &dest).await.unwrap();

        assert_eq!(audio.size_bytes, 4096);
        assert_eq!(std::fs::metadata(&dest).unwrap().len(), 4096);
    }

    #[tokio::test]
    async fn test_download_rejects_tiny_payload() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw(vec![0u8; 100], "audio/ogg"),
            )
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("tiny.ogg");
        let result = fetcher(1 << 20)
            .download(&format!("{}/tiny.ogg", server.uri()), &dest)
            .await;

        assert!(matches!(
            result,
            Err(AcquireError::PayloadTooSmall { size: 100, min: 1024 })
        ));
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn test_download_rejects_bad_url() {
        let dir = TempDir::new().unwrap();
        let result = fetcher(1024).download("not a url", &dir.path().join("x")).await;
        assert!(matches!(result, Err(AcquireError::InvalidUrl(_))));
    }
}
