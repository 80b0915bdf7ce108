//! Playlist and track catalog providers
//!
//! The orchestrator reads playlists and their ordered tracks through the
//! [`CatalogProvider`] trait. Two implementations are provided:
//!
//! - [`SpotifyCatalog`]: the Spotify Web API, paging through large playlists
//! - [`StaticCatalog`]: an in-memory catalog for embedding and tests
//!
//! ## Usage
//!
//! ```no_run
//! use playlist_dl::catalog::{CatalogProvider, SpotifyCatalog};
//! use playlist_dl::config::CatalogConfig;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut config = CatalogConfig::default();
//!     config.access_token = Some("token".to_string());
//!
//!     let catalog = SpotifyCatalog::new(&config)?;
//!     for playlist in catalog.list_playlists().await? {
//!         let tracks = catalog.list_tracks(&playlist.id).await?;
//!         println!("{}: {} tracks", playlist.name, tracks.len());
//!     }
//!     Ok(())
//! }
//! ```

mod memory;
mod spotify;

pub use memory::StaticCatalog;
pub use spotify::SpotifyCatalog;

use crate::types::{Playlist, Track};
use async_trait::async_trait;

/// Read-only lookup of playlists and their tracks
#[async_trait]
pub trait CatalogProvider: Send + Sync {
    /// List the playlists visible to the configured account
    async fn list_playlists(&self) -> crate::Result<Vec<Playlist>>;

    /// Look up a single playlist
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`](crate::Error::NotFound) when the playlist
    /// does not exist.
    async fn get_playlist(&self, playlist_id: &str) -> crate::Result<Playlist>;

    /// List the tracks of a playlist, in playlist order
    async fn list_tracks(&self, playlist_id: &str) -> crate::Result<Vec<Track>>;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}
