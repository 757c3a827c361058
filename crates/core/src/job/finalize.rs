//! Destination naming and atomic placement of the finished file.

use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};
use uuid::Uuid;

use super::types::JobMode;
use crate::encoder::Container;
use crate::tag;

/// Stem used when stripping the tag leaves nothing.
const FALLBACK_STEM: &str = "soundpost";

/// File name of the output for a source file name.
///
/// Inject drops the tag; extract re-tags with `hosted_url`, replacing any
/// tag the source already had.
pub fn destination_name(
    source_name: &str,
    mode: JobMode,
    container: Container,
    hosted_url: Option<&str>,
) -> String {
    let stem = Path::new(source_name)
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let mut stem = tag::strip(&stem);
    if stem.is_empty() {
        stem = FALLBACK_STEM.to_string();
    }

    match (mode, hosted_url) {
        (JobMode::Extract, Some(url)) => tag::format(&stem, url, container.extension()),
        _ => format!("{}.{}", stem, container.extension()),
    }
}

/// Full destination path next to the source.
pub fn destination_path(
    source: &Path,
    mode: JobMode,
    container: Container,
    hosted_url: Option<&str>,
) -> PathBuf {
    let name = source
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let dir = source.parent().unwrap_or_else(|| Path::new("."));
    dir.join(destination_name(&name, mode, container, hosted_url))
}

/// Attempts an atomic rename. Returns `Ok(false)` when source and
/// destination are on different filesystems.
async fn try_atomic_move(source: &Path, destination: &Path) -> io::Result<bool> {
    match fs::rename(source, destination).await {
        Ok(()) => Ok(true),
        Err(e) => {
            // EXDEV is 18 on Linux
            if e.kind() == io::ErrorKind::CrossesDevices || e.raw_os_error() == Some(18) {
                Ok(false)
            } else {
                Err(e)
            }
        }
    }
}

/// Temporary name beside `destination`, on the same filesystem.
fn partial_path(destination: &Path) -> PathBuf {
    let name = destination
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let dir = destination.parent().unwrap_or_else(|| Path::new("."));
    dir.join(format!(".{}.{}.partial", name, Uuid::new_v4().simple()))
}

/// Copies `staged` next to `destination`, then renames it into place.
pub(crate) async fn copy_into_place(staged: &Path, destination: &Path) -> io::Result<()> {
    let partial = partial_path(destination);
    let result = async {
        fs::copy(staged, &partial).await?;
        fs::rename(&partial, destination).await
    }
    .await;

    if let Err(e) = result {
        if let Err(rm) = fs::remove_file(&partial).await {
            debug!("No partial file to clean up at {}: {}", partial.display(), rm);
        }
        return Err(e);
    }
    Ok(())
}

/// Moves a finished file to `destination`, replacing whatever is there.
///
/// Readers of `destination` see either the old file or the complete new
/// one, never a partial write.
pub async fn place(staged: &Path, destination: &Path) -> io::Result<()> {
    if try_atomic_move(staged, destination).await? {
        debug!("Renamed {} -> {}", staged.display(), destination.display());
        return Ok(());
    }

    debug!("Cross-device placement, copying via sibling temp file");
    copy_into_place(staged, destination).await?;
    if let Err(e) = fs::remove_file(staged).await {
        warn!("Failed to remove staged file {}: {}", staged.display(), e);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_inject_name_drops_tag() {
        assert_eq!(
            destination_name(
                "clip [sound=example.com%2Fa.mp3].mp4",
                JobMode::Inject,
                Container::Mp4,
                None
            ),
            "clip.mp4"
        );
        assert_eq!(
            destination_name("still [SOUND=x].png", JobMode::Inject, Container::Webm, None),
            "still.webm"
        );
    }

    #[test]
    fn test_extract_name_adds_tag() {
        assert_eq!(
            destination_name(
                "clip.mp4",
                JobMode::Extract,
                Container::Mp4,
                Some("https://host/x")
            ),
            "clip [sound=https%3A%2F%2Fhost%2Fx].mp4"
        );
    }

    #[test]
    fn test_extract_name_replaces_old_tag() {
        let name = destination_name(
            "clip [sound=old.example%2Fa.ogg].webm",
            JobMode::Extract,
            Container::Webm,
            Some("https://new/b"),
        );
        assert_eq!(name, "clip [sound=https%3A%2F%2Fnew%2Fb].webm");
        assert_eq!(tag::extract(&name).as_deref(), Some("https://new/b"));
    }

    #[test]
    fn test_empty_stem_falls_back() {
        assert_eq!(
            destination_name("[sound=x].mp4", JobMode::Inject, Container::Mp4, None),
            "soundpost.mp4"
        );
    }

    #[test]
    fn test_destination_is_beside_source() {
        let path = destination_path(
            Path::new("/media/in/clip [sound=x].webm"),
            JobMode::Inject,
            Container::Mp4,
            None,
        );
        assert_eq!(path, PathBuf::from("/media/in/clip.mp4"));
    }

    #[tokio::test]
    async fn test_place_replaces_existing() {
        let dir = TempDir::new().unwrap();
        let staged = dir.path().join("staged.mp4");
        let dest = dir.path().join("clip.mp4");
        std::fs::write(&staged, b"new").unwrap();
        std::fs::write(&dest, b"old").unwrap();

        place(&staged, &dest).await.unwrap();

        assert_eq!(std::fs::read(&dest).unwrap(), b"new");
        assert!(!staged.exists());
    }

    #[tokio::test]
    async fn test_copy_into_place_leaves_no_partials() {
        let src_dir = TempDir::new().unwrap();
        let dest_dir = TempDir::new().unwrap();
        let staged = src_dir.path().join("staged.mp4");
        let dest = dest_dir.path().join("clip.mp4");
        std::fs::write(&staged, b"payload").unwrap();

        copy_into_place(&staged, &dest).await.unwrap();

        assert_eq!(std::fs::read(&dest).unwrap(), b"payload");
        let entries: Vec<_> = std::fs::read_dir(dest_dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[tokio::test]
    async fn test_copy_into_place_missing_source() {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("clip.mp4");
        let result = copy_into_place(&dir.path().join("nope"), &dest).await;

        assert!(result.is_err());
        assert!(!dest.exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
