//! In-memory catalog

use super::CatalogProvider;
use crate::error::{Error, Result};
use crate::types::{Playlist, Track};
use async_trait::async_trait;

/// Catalog backed by a fixed list of playlists
///
/// Useful when the host application already has the track list, and in tests.
#[derive(Clone, Debug, Default)]
pub struct StaticCatalog {
    playlists: Vec<(Playlist, Vec<Track>)>,
}

impl StaticCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a playlist with its tracks; a playlist with the same ID is replaced
    pub fn with_playlist(mut self, playlist: Playlist, tracks: Vec<Track>) -> Self {
        self.playlists.retain(|(existing, _)| existing.id != playlist.id);
        self.playlists.push((playlist, tracks));
        self
    }

    fn find(&self, playlist_id: &str) -> Result<&(Playlist, Vec<Track>)> {
        self.playlists
            .iter()
            .find(|(playlist, _)| playlist.id == playlist_id)
            .ok_or_else(|| Error::NotFound(format!("playlist {playlist_id}")))
    }
}

#[async_trait]
impl CatalogProvider for StaticCatalog {
    async fn list_playlists(&self) -> Result<Vec<Playlist>> {
        Ok(self.playlists.iter().map(|(p, _)| p.clone()).collect())
    }

    async fn get_playlist(&self, playlist_id: &str) -> Result<Playlist> {
        self.find(playlist_id).map(|(p, _)| p.clone())
    }

    async fn list_tracks(&self, playlist_id: &str) -> Result<Vec<Track>> {
        self.find(playlist_id).map(|(_, tracks)| tracks.clone())
    }

    fn name(&self) -> &'static str {
        "static"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn lists_tracks_in_insertion_order() {
        let catalog = StaticCatalog::new().with_playlist(
            Playlist::new("p1", "Road Trip"),
            vec![Track::new("a", "x"), Track::new("b", "y")],
        );

        let tracks = catalog.list_tracks("p1").await.unwrap();
        assert_eq!(tracks.len(), 2);
        assert_eq!(tracks[0].name, "a");
        assert_eq!(tracks[1].name, "b");
    }

    #[tokio::test]
    async fn unknown_playlist_is_not_found() {
        let catalog = StaticCatalog::new();
        assert!(matches!(
            catalog.get_playlist("missing").await,
            Err(Error::NotFound(_))
        ));
        assert!(matches!(
            catalog.list_tracks("missing").await,
            Err(Error::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn re_adding_a_playlist_replaces_it() {
        let catalog = StaticCatalog::new()
            .with_playlist(Playlist::new("p1", "Old"), vec![])
            .with_playlist(Playlist::new("p1", "New"), vec![Track::new("a", "x")]);

        let playlists = catalog.list_playlists().await.unwrap();
        assert_eq!(playlists, vec![Playlist::new("p1", "New")]);
    }
}
