//! Spotify Web API catalog

use super::CatalogProvider;
use crate::config::CatalogConfig;
use crate::error::{Error, Result};
use crate::types::{Playlist, Track};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

/// Spotify caps `/me/playlists` pages at 50 items
const PLAYLIST_PAGE_LIMIT: usize = 50;

/// Spotify caps playlist track pages at 100 items
const TRACK_PAGE_LIMIT: usize = 100;

/// Name used when a catalog track has no name
const UNKNOWN_NAME: &str = "unknown";

/// Artist used when a catalog track lists no artists
const UNKNOWN_ARTIST: &str = "unknown artist";

/// Catalog provider backed by the Spotify Web API
///
/// Requires an OAuth bearer token in [`CatalogConfig::access_token`]; token
/// acquisition and refresh are left to the host application.
#[derive(Clone, Debug)]
pub struct SpotifyCatalog {
    client: reqwest::Client,
    api_base: String,
    access_token: Option<String>,
    page_size: usize,
}

#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
struct Page<T> {
    #[serde(default)]
    items: Vec<T>,
    #[serde(default)]
    next: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PlaylistObject {
    id: String,
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PlaylistItem {
    #[serde(default)]
    track: Option<TrackObject>,
}

#[derive(Debug, Deserialize)]
struct TrackObject {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    artists: Vec<ArtistObject>,
    #[serde(default)]
    album: Option<AlbumObject>,
}

#[derive(Debug, Deserialize)]
struct ArtistObject {
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AlbumObject {
    #[serde(default)]
    name: Option<String>,
}

impl From<PlaylistObject> for Playlist {
    fn from(p: PlaylistObject) -> Self {
        Playlist {
            name: p.name.unwrap_or_default(),
            id: p.id,
        }
    }
}

impl From<TrackObject> for Track {
    fn from(t: TrackObject) -> Self {
        let name = non_empty(t.name).unwrap_or_else(|| UNKNOWN_NAME.to_string());
        let artist = t
            .artists
            .into_iter()
            .find_map(|a| non_empty(a.name))
            .unwrap_or_else(|| UNKNOWN_ARTIST.to_string());
        let album = t.album.and_then(|a| non_empty(a.name));

        Track {
            name,
            artist,
            album,
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

impl SpotifyCatalog {
    /// Create a catalog client from configuration
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be created
    pub fn new(config: &CatalogConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(concat!("playlist-dl/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Other(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            access_token: config.access_token.clone(),
            page_size: config.page_size.max(1),
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let token = self.access_token.as_deref().ok_or(Error::NotAuthenticated)?;
        let url = format!("{}{}", self.api_base, path);
        debug!(url = %url, "catalog request");

        let response = self
            .client
            .get(&url)
            .bearer_auth(token)
            .query(query)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::Catalog(format!("timeout requesting {path}"))
                } else {
                    Error::Catalog(format!("request to {path} failed: {e}"))
                }
            })?;

        match response.status() {
            status if status.is_success() => response
                .json::<T>()
                .await
                .map_err(|e| Error::Catalog(format!("invalid response from {path}: {e}"))),
            StatusCode::UNAUTHORIZED => Err(Error::NotAuthenticated),
            StatusCode::NOT_FOUND => Err(Error::NotFound(path.trim_start_matches('/').to_string())),
            status => Err(Error::Catalog(format!("{path} returned HTTP {status}"))),
        }
    }

    /// Follow pages of `limit` items until a short or final page
    async fn collect_pages<T: DeserializeOwned>(&self, path: &str, limit: usize) -> Result<Vec<T>> {
        let mut items = Vec::new();
        let mut offset = 0usize;

        loop {
            let page: Page<T> = self
                .get_json(
                    path,
                    &[("limit", limit.to_string()), ("offset", offset.to_string())],
                )
                .await?;

            let count = page.items.len();
            items.extend(page.items);
            offset += count;

            if count < limit || page.next.is_none() {
                break;
            }
        }

        Ok(items)
    }
}

#[async_trait]
impl CatalogProvider for SpotifyCatalog {
    async fn list_playlists(&self) -> Result<Vec<Playlist>> {
        let limit = self.page_size.min(PLAYLIST_PAGE_LIMIT);
        let playlists: Vec<PlaylistObject> = self.collect_pages("/me/playlists", limit).await?;
        Ok(playlists.into_iter().map(Playlist::from).collect())
    }

    async fn get_playlist(&self, playlist_id: &str) -> Result<Playlist> {
        let path = format!("/playlists/{}", urlencoding::encode(playlist_id));
        let playlist: PlaylistObject = self
            .get_json(&path, &[("fields", "id,name".to_string())])
            .await
            .map_err(|e| match e {
                Error::NotFound(_) => Error::NotFound(format!("playlist {playlist_id}")),
                other => other,
            })?;
        Ok(playlist.into())
    }

    async fn list_tracks(&self, playlist_id: &str) -> Result<Vec<Track>> {
        let path = format!("/playlists/{}/tracks", urlencoding::encode(playlist_id));
        let items: Vec<PlaylistItem> = self
            .collect_pages(&path, self.page_size.min(TRACK_PAGE_LIMIT))
            .await
            .map_err(|e| match e {
                Error::NotFound(_) => Error::NotFound(format!("playlist {playlist_id}")),
                other => other,
            })?;

        // Local files and removed tracks come back as `track: null`
        Ok(items
            .into_iter()
            .map(|item| match item.track {
                Some(track) => Track::from(track),
                None => Track::new(UNKNOWN_NAME, UNKNOWN_ARTIST),
            })
            .collect())
    }

    fn name(&self) -> &'static str {
        "spotify"
    }
}
