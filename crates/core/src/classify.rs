//! Asset classification by MIME type.
//!
//! The content is sniffed from the file's magic bytes; when that yields
//! nothing the type is guessed from the extension. No further verification
//! happens here: a file whose bytes lie about their type fails later, inside
//! the encoder.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use tracing::debug;

/// Video MIME types accepted as a soundpost source.
pub const SUPPORTED_VIDEO_TYPES: &[&str] = &[
    "video/mp4",
    "video/webm",
    "video/quicktime",
    "video/x-matroska",
    "video/x-m4v",
];

/// Still-image MIME types that can be turned into a looped video.
pub const SUPPORTED_IMAGE_TYPES: &[&str] = &[
    "image/jpeg",
    "image/png",
    "image/gif",
    "image/webp",
    "image/bmp",
];

/// Kind of media a source file holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetKind {
    Audio,
    Image,
    Video,
    Unsupported,
}

impl AssetKind {
    /// Maps a MIME essence string (`type/subtype`) to an asset kind.
    pub fn from_mime(mime: &str) -> Self {
        let mime = mime.trim().to_ascii_lowercase();
        if SUPPORTED_VIDEO_TYPES.contains(&mime.as_str()) {
            Self::Video
        } else if SUPPORTED_IMAGE_TYPES.contains(&mime.as_str()) {
            Self::Image
        } else if mime.starts_with("audio/") {
            Self::Audio
        } else {
            Self::Unsupported
        }
    }

    /// Whether this kind can carry a muxed soundpost.
    pub fn is_visual(&self) -> bool {
        matches!(self, Self::Image | Self::Video)
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Audio => "audio",
            Self::Image => "image",
            Self::Video => "video",
            Self::Unsupported => "unsupported",
        };
        f.write_str(name)
    }
}

/// Sniffs the MIME type of a file.
pub fn sniff_mime(path: &Path) -> Option<String> {
    match infer::get_from_path(path) {
        Ok(Some(kind)) => return Some(kind.mime_type().to_string()),
        Ok(None) => {}
        Err(e) => {
            debug!("Content sniffing failed for {}: {}", path.display(), e);
        }
    }

    mime_guess::from_path(path)
        .first()
        .map(|m| m.essence_str().to_string())
}

/// Classifies a source file. Sniffing failures yield `Unsupported`.
pub fn classify(path: &Path) -> AssetKind {
    match sniff_mime(path) {
        Some(mime) => {
            let kind = AssetKind::from_mime(&mime);
            debug!("Classified {} as {} ({})", path.display(), kind, mime);
            kind
        }
        None => AssetKind::Unsupported,
    }
}
