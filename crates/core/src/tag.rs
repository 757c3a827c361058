//! Codec for the `[sound=URL]` filename tag.
//!
//! A soundpost carries a reference to externally hosted audio in its file
//! name, e.g. `clip [sound=files.catbox.moe%2Fabc.mp3].webm`. The URL inside
//! the tag is percent-encoded so it survives as a single path component.

use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex_lite::Regex;

/// Matches the first `[sound=...]` tag, case-insensitively, capturing the URL.
static TAG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\[sound\s*=\s*(.*?)\]").expect("valid tag regex"));

/// Matches a leading URL scheme such as `https://`.
static SCHEME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*://").expect("valid scheme regex"));

/// A sound tag parsed from a filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoundTag {
    /// Decoded absolute URL of the hosted audio.
    pub raw_url: String,
}

impl SoundTag {
    /// Parses the tag out of a filename, if one is present.
    pub fn from_filename(filename: &str) -> Option<Self> {
        extract(filename).map(|raw_url| Self { raw_url })
    }
}

/// Extracts and decodes the URL from a `[sound=...]` tag.
///
/// A URL without a scheme gets `https://` prepended.
pub fn extract(filename: &str) -> Option<String> {
    let caps = TAG_RE.captures(filename)?;
    let encoded = caps.get(1)?.as_str().trim();
    if encoded.is_empty() {
        return None;
    }

    let decoded = urlencoding::decode_binary(encoded.as_bytes());
    let url = String::from_utf8_lossy(&decoded).trim().to_string();

    if SCHEME_RE.is_match(&url) {
        Some(url)
    } else {
        Some(format!("https://{}", url))
    }
}

/// Removes the first `[sound=...]` tag from a stem and trims whitespace.
pub fn strip(stem: &str) -> String {
    TAG_RE.replace(stem, "").trim().to_string()
}

/// Builds `"<stem> [sound=<encoded url>].<extension>"`.
///
/// Every character outside the unreserved set is percent-encoded, so the
/// tag never contains `/`, `:` or `]`.
pub fn format(stem: &str, url: &str, extension: &str) -> String {
    let encoded: Cow<'_, str> = urlencoding::encode(url);
    let stem = stem.trim();
    let extension = extension.trim_start_matches('.');

    if extension.is_empty() {
        format!("{} [sound={}]", stem, encoded)
    } else {
        format!("{} [sound={}].{}", stem, encoded, extension)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_adds_scheme() {
        let url = extract("clip [sound=example.com/a.mp3].mp4");
        assert_eq!(url.as_deref(), Some("https://example.com/a.mp3"));
    }

    #[test]
    fn test_extract_percent_decodes() {
        let url = extract("clip [sound=https%3A%2F%2Ffiles.catbox.moe%2Fab12.ogg].webm");
        assert_eq!(url.as_deref(), Some("https://files.catbox.moe/ab12.ogg"));
    }

    #[test]
    fn test_extract_keeps_existing_scheme() {
        let url = extract("x [sound=http://host/y.mp3].png");
        assert_eq!(url.as_deref(), Some("http://host/y.mp3"));
    }

    #[test]
    fn test_extract_is_case_insensitive() {
        let expected = Some("https://example.com/a.mp3".to_string());
        assert_eq!(extract("a [sound=example.com/a.mp3].mp4"), expected);
        assert_eq!(extract("a [SOUND=example.com/a.mp3].mp4"), expected);
        assert_eq!(extract("a [Sound=example.com/a.mp3].mp4"), expected);
    }

    #[test]
    fn test_extract_tolerates_spaces_around_equals() {
        let url = extract("a [sound = example.com/a.mp3].mp4");
        assert_eq!(url.as_deref(), Some("https://example.com/a.mp3"));
    }

    #[test]
    fn test_extract_none_without_tag() {
        assert_eq!(extract("clip.mp4"), None);
        assert_eq!(extract("clip [sound=].mp4"), None);
        assert!(SoundTag::from_filename("plain name.webm").is_none());
    }

    #[test]
    fn test_extract_first_tag_only() {
        let url = extract("a [sound=one.com/1.mp3] [sound=two.com/2.mp3].mp4");
        assert_eq!(url.as_deref(), Some("https://one.com/1.mp3"));
    }

    #[test]
    fn test_strip_removes_tag() {
        assert_eq!(strip("clip [sound=example.com/a.mp3]"), "clip");
        assert_eq!(strip("[SOUND=x.com/y]  my clip "), "my clip");
    }

    #[test]
    fn test_strip_without_tag_is_unchanged() {
        assert_eq!(strip("clip"), "clip");
    }

    #[test]
    fn test_strip_is_idempotent() {
        for stem in ["clip [sound=a.com/b]", "plain", " padded [Sound=q] ", ""] {
            let once = strip(stem);
            assert_eq!(strip(&once), once);
        }
    }

    #[test]
    fn test_format_encodes_everything() {
        let name = format("clip", "https://host/x", "mp4");
        assert_eq!(name, "clip [sound=https%3A%2F%2Fhost%2Fx].mp4");
    }

    #[test]
    fn test_format_accepts_dotted_extension() {
        assert_eq!(format("a", "https://h/x", ".webm"), "a [sound=https%3A%2F%2Fh%2Fx].webm");
    }

    #[test]
    fn test_round_trip_contract() {
        let urls = [
            "https://files.catbox.moe/abc123.mp3",
            "https://host/path with spaces/[weird].ogg?x=1&y=2",
            "http://example.org/ünïcode.opus",
        ];
        for stem in ["clip", "my video 2", "a_b-c.d"] {
            for url in urls {
                let name = format(stem, url, "mp4");
                let file_stem = name.strip_suffix(".mp4").unwrap();
                assert_eq!(extract(&name).as_deref(), Some(url));
                assert_eq!(strip(file_stem).trim(), stem);
            }
        }
    }
}
