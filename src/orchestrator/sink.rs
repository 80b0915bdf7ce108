//! Where batch artifacts end up.

use crate::config::FileCollisionAction;
use crate::error::{AcquisitionError, Result};
use crate::naming::{get_unique_path, sanitize_file_name};
use crate::types::{Artifact, Playlist};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Receives the artifacts produced by a batch job
///
/// Interactive downloads hand their artifact straight to the caller; batch
/// jobs have no caller to hand to, so each artifact goes to the sink.
#[async_trait]
pub trait ArtifactSink: Send + Sync {
    /// Take ownership of `artifact`, produced for a track of `playlist`
    ///
    /// # Errors
    ///
    /// A failure is recorded as a track-level delivery error; the batch goes on.
    async fn deliver(&self, playlist: &Playlist, artifact: Artifact) -> Result<()>;

    /// Whether the sink already holds an artifact with this stem
    ///
    /// Track listings report it as downloaded. Unless the collision policy is
    /// `overwrite`, batch jobs report such tracks as skipped without fetching them.
    async fn contains(&self, _playlist: &Playlist, _stem: &str) -> bool {
        false
    }

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}

/// Writes artifacts to `{root}/{playlist name}/{stem}.{ext}`
#[derive(Clone, Debug)]
pub struct DirectorySink {
    root: PathBuf,
    collision: FileCollisionAction,
    extension: String,
}

impl DirectorySink {
    /// Create a sink rooted at `root`
    ///
    /// `extension` is the format the fetcher produces; it is used to recognise
    /// tracks that are already on disk.
    pub fn new(root: impl Into<PathBuf>, collision: FileCollisionAction, extension: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            collision,
            extension: extension.into(),
        }
    }

    /// Directory holding a playlist's files
    pub fn playlist_dir(&self, playlist: &Playlist) -> PathBuf {
        self.root.join(sanitize_file_name(&playlist.name))
    }

    async fn write_atomically(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
        let mut partial = path.as_os_str().to_os_string();
        partial.push(".part");
        let partial = PathBuf::from(partial);

        tokio::fs::write(&partial, bytes).await?;
        if let Err(e) = tokio::fs::rename(&partial, path).await {
            tokio::fs::remove_file(&partial).await.ok();
            return Err(e);
        }
        Ok(())
    }
}

#[async_trait]
impl ArtifactSink for DirectorySink {
    async fn deliver(&self, playlist: &Playlist, artifact: Artifact) -> Result<()> {
        let dir = self.playlist_dir(playlist);
        tokio::fs::create_dir_all(&dir).await.map_err(|e| {
            AcquisitionError::Delivery(format!("cannot create {}: {}", dir.display(), e))
        })?;

        let path = get_unique_path(&dir.join(artifact.file_name()), self.collision)?;
        Self::write_atomically(&path, &artifact.bytes)
            .await
            .map_err(|e| AcquisitionError::Delivery(format!("cannot write {}: {}", path.display(), e)))?;

        tracing::debug!(path = %path.display(), bytes = artifact.len(), "Artifact written");
        Ok(())
    }

    async fn contains(&self, playlist: &Playlist, stem: &str) -> bool {
        let path = self
            .playlist_dir(playlist)
            .join(format!("{stem}.{}", self.extension));
        tokio::fs::try_exists(&path).await.unwrap_or(false)
    }

    fn name(&self) -> &'static str {
        "directory"
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::types::ArtifactMetadata;
    use tempfile::TempDir;

    fn artifact(stem: &str, bytes: &[u8]) -> Artifact {
        Artifact {
            stem: stem.to_string(),
            extension: "mp3".to_string(),
            bytes: bytes.to_vec(),
            metadata: ArtifactMetadata::default(),
        }
    }

    #[tokio::test]
    async fn writes_into_sanitized_playlist_folder() {
        let temp_dir = TempDir::new().unwrap();
        let sink = DirectorySink::new(temp_dir.path(), FileCollisionAction::Rename, "mp3");
        let playlist = Playlist::new("p1", "Rock/Pop: Best?");

        sink.deliver(&playlist, artifact("Song by Artist", b"abc"))
            .await
            .unwrap();

        let written = temp_dir.path().join("RockPop Best").join("Song by Artist.mp3");
        assert_eq!(std::fs::read(&written).unwrap(), b"abc");
        assert!(!temp_dir.path().join("RockPop Best").join("Song by Artist.mp3.part").exists());
        assert!(sink.contains(&playlist, "Song by Artist").await);
        assert!(!sink.contains(&playlist, "Other by Artist").await);
    }

    #[tokio::test]
    async fn rename_keeps_both_files() {
        let temp_dir = TempDir::new().unwrap();
        let sink = DirectorySink::new(temp_dir.path(), FileCollisionAction::Rename, "mp3");
        let playlist = Playlist::new("p1", "Mix");

        sink.deliver(&playlist, artifact("a", b"1")).await.unwrap();
        sink.deliver(&playlist, artifact("a", b"2")).await.unwrap();

        assert_eq!(std::fs::read(temp_dir.path().join("Mix/a.mp3")).unwrap(), b"1");
        assert_eq!(std::fs::read(temp_dir.path().join("Mix/a (1).mp3")).unwrap(), b"2");
    }

    #[tokio::test]
    async fn skip_policy_reports_delivery_error() {
        let temp_dir = TempDir::new().unwrap();
        let sink = DirectorySink::new(temp_dir.path(), FileCollisionAction::Skip, "mp3");
        let playlist = Playlist::new("p1", "Mix");

        sink.deliver(&playlist, artifact("a", b"1")).await.unwrap();
        let result = sink.deliver(&playlist, artifact("a", b"2")).await;

        assert!(matches!(
            result,
            Err(Error::Acquisition(AcquisitionError::Delivery(_)))
        ));
    }

    #[tokio::test]
    async fn overwrite_policy_replaces_existing_files() {
        let temp_dir = TempDir::new().unwrap();
        let sink = DirectorySink::new(temp_dir.path(), FileCollisionAction::Overwrite, "mp3");
        let playlist = Playlist::new("p1", "Mix");

        sink.deliver(&playlist, artifact("a", b"1")).await.unwrap();
        assert!(sink.contains(&playlist, "a").await);

        sink.deliver(&playlist, artifact("a", b"2")).await.unwrap();
        assert_eq!(std::fs::read(temp_dir.path().join("Mix/a.mp3")).unwrap(), b"2");
    }
}
